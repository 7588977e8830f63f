use alloy_primitives::{address, Address, Bytes, B256};
use anyhow::anyhow;
use std::io::{Cursor, Read};
use thiserror::Error;

/// Sender credited on messages synthesized from sequencer batch segments.
/// The tail spells "sequencer" in ASCII.
pub const SEQUENCER_ADDRESS: Address = address!("a4b000000000000000000073657175656e636572");

pub const L1_MESSAGE_TYPE_L2_MESSAGE: u8 = 3;

pub const L2_MESSAGE_KIND_SIGNED_TX: u8 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct L1IncomingMessageHeader {
    pub kind: u8,
    pub sender: Address,
    pub block_number: B256,
    pub timestamp: B256,
    pub request_id: B256,
    pub gas_price_l1: B256,
}

impl L1IncomingMessageHeader {
    /// The delayed-inbox sequence number carried in the request id's low
    /// quadword. Errors if the high bytes are occupied.
    pub fn seq_num(&self) -> anyhow::Result<u64> {
        let bytes = self.request_id.as_slice();
        if bytes[..24].iter().any(|b| *b != 0) {
            return Err(anyhow!("requestId {} out of uint64 range", self.request_id));
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[24..]);
        Ok(u64::from_be_bytes(low))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct L1IncomingMessage {
    pub header: L1IncomingMessageHeader,
    pub l2msg: Bytes,
}

/// A truncated L1 message. Whatever prefix of the header decoded before the
/// failing read rides along, with the remaining fields zeroed.
#[derive(Debug, Error)]
#[error("malformed L1 message")]
pub struct L1MessageParseError {
    pub partial: Option<L1IncomingMessage>,
    #[source]
    pub source: std::io::Error,
}

fn read_exact<const N: usize>(rdr: &mut Cursor<&[u8]>) -> std::io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    rdr.read_exact(&mut buf)?;
    Ok(buf)
}

/// Decodes the flat wire layout of an L1-posted message: a kind byte, then
/// five 32-byte words (sender, block number, timestamp, request id, gas
/// price), then the L2 payload until end of input. On a short read the error
/// carries the partially decoded message.
pub fn parse_incoming_l1_message(data: &[u8]) -> Result<L1IncomingMessage, L1MessageParseError> {
    let mut rdr = Cursor::new(data);
    let kind = match read_exact::<1>(&mut rdr) {
        Ok(byte) => byte[0],
        Err(source) => return Err(L1MessageParseError { partial: None, source }),
    };
    let mut message = L1IncomingMessage {
        header: L1IncomingMessageHeader {
            kind,
            sender: Address::ZERO,
            block_number: B256::ZERO,
            timestamp: B256::ZERO,
            request_id: B256::ZERO,
            gas_price_l1: B256::ZERO,
        },
        l2msg: Bytes::new(),
    };
    match fill_remainder(&mut rdr, &mut message) {
        Ok(()) => Ok(message),
        Err(source) => Err(L1MessageParseError {
            partial: Some(message),
            source,
        }),
    }
}

fn fill_remainder(rdr: &mut Cursor<&[u8]>, message: &mut L1IncomingMessage) -> std::io::Result<()> {
    let sender32 = read_exact::<32>(rdr)?;
    message.header.sender = Address::from_slice(&sender32[12..]);
    message.header.block_number = B256::from(read_exact::<32>(rdr)?);
    message.header.timestamp = B256::from(read_exact::<32>(rdr)?);
    message.header.request_id = B256::from(read_exact::<32>(rdr)?);
    message.header.gas_price_l1 = B256::from(read_exact::<32>(rdr)?);
    let mut l2msg = Vec::new();
    rdr.read_to_end(&mut l2msg)?;
    message.l2msg = Bytes::from(l2msg);
    Ok(())
}

pub fn serialize_incoming_l1_message(msg: &L1IncomingMessage) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 5 * 32 + msg.l2msg.len());
    out.push(msg.header.kind);
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(msg.header.sender.as_slice());
    out.extend_from_slice(msg.header.block_number.as_slice());
    out.extend_from_slice(msg.header.timestamp.as_slice());
    out.extend_from_slice(msg.header.request_id.as_slice());
    out.extend_from_slice(msg.header.gas_price_l1.as_slice());
    out.extend_from_slice(&msg.l2msg);
    out
}
