use alloy_primitives::Bytes;
use alloy_rlp::Decodable;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::warn;

/// Hard cap on the decompressed size of a batch's segment payload.
pub const MAX_DECOMPRESSED_LEN: usize = 16 * 1024 * 1024;

const HEADER_LEN: usize = 40;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("sequencer message missing L1 header ({0} bytes)")]
    ShortHeader(usize),
    #[error("decompressed sequencer message exceeds 16 MiB")]
    DecompressedTooLarge,
    #[error("brotli decompression failed: {0}")]
    Decompress(#[from] std::io::Error),
}

/// A decoded sequencer batch: timestamp and L1-block clamps, the delayed
/// message count the batch settles at, and its typed segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencerMessage {
    pub min_timestamp: u64,
    pub max_timestamp: u64,
    pub min_l1_block: u64,
    pub max_l1_block: u64,
    pub after_delayed_messages: u64,
    pub segments: Vec<Bytes>,
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

/// Decodes a raw batch: a 40-byte big-endian header followed by a
/// brotli-compressed RLP list of segments.
///
/// A header that is too short or a payload that fails to decompress (or blows
/// the size cap) is an error. A payload whose RLP does not decode is not: the
/// batch still occupies its position in the stream, so it degrades to an
/// empty segment list and lets the multiplexer fall through to the delayed
/// queue.
pub fn parse_sequencer_message(data: &[u8]) -> Result<SequencerMessage, BatchError> {
    if data.len() < HEADER_LEN {
        return Err(BatchError::ShortHeader(data.len()));
    }
    let min_timestamp = be_u64(&data[0..8]);
    let max_timestamp = be_u64(&data[8..16]);
    let min_l1_block = be_u64(&data[16..24]);
    let max_l1_block = be_u64(&data[24..32]);
    let after_delayed_messages = be_u64(&data[32..40]);

    let mut payload = Vec::new();
    let reader = brotli::Decompressor::new(&data[HEADER_LEN..], 4096);
    reader
        .take(MAX_DECOMPRESSED_LEN as u64 + 1)
        .read_to_end(&mut payload)?;
    if payload.len() > MAX_DECOMPRESSED_LEN {
        return Err(BatchError::DecompressedTooLarge);
    }

    let mut view = payload.as_slice();
    let segments = match Vec::<Bytes>::decode(&mut view) {
        Ok(segments) => segments,
        Err(err) => {
            warn!(%err, "error parsing sequencer message segments");
            Vec::new()
        }
    };

    Ok(SequencerMessage {
        min_timestamp,
        max_timestamp,
        min_l1_block,
        max_l1_block,
        after_delayed_messages,
        segments,
    })
}

impl SequencerMessage {
    /// Inverse of [`parse_sequencer_message`] for well-formed batches.
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.min_timestamp.to_be_bytes());
        out.extend_from_slice(&self.max_timestamp.to_be_bytes());
        out.extend_from_slice(&self.min_l1_block.to_be_bytes());
        out.extend_from_slice(&self.max_l1_block.to_be_bytes());
        out.extend_from_slice(&self.after_delayed_messages.to_be_bytes());

        let segments_rlp = alloy_rlp::encode(&self.segments);
        let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 6, 22);
        writer.write_all(&segments_rlp)?;
        writer.flush()?;
        drop(writer);
        Ok(out)
    }
}
