use alloy_primitives::{Bytes, B256};
use alloy_rlp::Decodable;
use thiserror::Error;
use tracing::warn;

use arbmux_primitives::l1::{
    parse_incoming_l1_message, L1IncomingMessage, L1IncomingMessageHeader,
    L1_MESSAGE_TYPE_L2_MESSAGE, L2_MESSAGE_KIND_SIGNED_TX, SEQUENCER_ADDRESS,
};
use arbmux_primitives::message::MessageWithMetadata;

use crate::batch::{parse_sequencer_message, BatchError, SequencerMessage};

pub const SEGMENT_KIND_L2_MESSAGE: u8 = 0;
pub const SEGMENT_KIND_DELAYED_MESSAGES: u8 = 1;
pub const SEGMENT_KIND_ADVANCE_TIMESTAMP: u8 = 2;
pub const SEGMENT_KIND_ADVANCE_L1_BLOCK_NUMBER: u8 = 3;

/// Cursor over the sequencer batch stream and the delayed inbox. The
/// multiplexer is the only caller and never calls concurrently.
pub trait InboxBackend {
    /// Raw bytes of the batch at the current cursor; stable across repeated
    /// calls at the same position.
    fn peek_sequencer_inbox(&mut self) -> anyhow::Result<Vec<u8>>;
    fn get_sequencer_inbox_position(&self) -> u64;
    fn advance_sequencer_inbox(&mut self);

    fn get_position_within_message(&self) -> u64;
    fn set_position_within_message(&mut self, pos: u64);

    fn read_delayed_inbox(&self, seq_num: u64) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Error)]
pub enum MultiplexerError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("empty sequencer message segment")]
    EmptySegment,
    #[error("bad delayed message reading count")]
    BadDelayedCount,
    #[error("malformed delayed messages segment: {0}")]
    MalformedDelayedSegment(alloy_rlp::Error),
    #[error("timing segment left unconsumed")]
    UnexpectedAdvance,
    #[error("bad sequencer message segment kind {0}")]
    UnknownSegmentKind(u8),
    #[error("reading end of sequencer message ({segments} segments)")]
    EndOfSequencerMessage { segments: usize },
    #[error("failed to parse delayed message {seq_num}")]
    DelayedParse {
        seq_num: u64,
        /// Whatever prefix of the message decoded before the failure.
        partial: Option<L1IncomingMessage>,
        #[source]
        source: std::io::Error,
    },
    #[error("inbox backend failure")]
    Backend(#[source] anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AdvanceAction {
    Unknown,
    DelayedMessage,
    Segment,
    Message,
}

/// Replays the canonical message order from an [`InboxBackend`] cursor.
///
/// `peek` computes the next message without moving the cursor and records
/// which of {next delayed read, next segment, next batch} a subsequent
/// `advance` must perform; `advance` applies exactly that. Keeping all
/// backend mutation inside `advance` makes `peek` idempotent, which the
/// replay protocol relies on.
pub struct InboxMultiplexer<'a, B: InboxBackend> {
    backend: &'a mut B,
    delayed_messages_read: u64,
    advance_action: AdvanceAction,
    advance_segment_to: u64,
    sequencer_message_cache: Option<SequencerMessage>,
    sequencer_message_cache_position: u64,
}

impl<'a, B: InboxBackend> InboxMultiplexer<'a, B> {
    pub fn new(backend: &'a mut B, delayed_messages_read: u64) -> Self {
        Self {
            backend,
            delayed_messages_read,
            advance_action: AdvanceAction::Unknown,
            advance_segment_to: 0,
            sequencer_message_cache: None,
            sequencer_message_cache_position: 0,
        }
    }

    pub fn delayed_messages_read(&self) -> u64 {
        self.delayed_messages_read
    }

    pub fn peek(&mut self) -> Result<MessageWithMetadata, MultiplexerError> {
        let position = self.backend.get_sequencer_inbox_position();
        let seq_msg = match &mut self.sequencer_message_cache {
            Some(cached) if self.sequencer_message_cache_position == position => &*cached,
            cache => {
                let raw = self
                    .backend
                    .peek_sequencer_inbox()
                    .map_err(MultiplexerError::Backend)?;
                self.sequencer_message_cache_position = position;
                &*cache.insert(parse_sequencer_message(&raw)?)
            }
        };

        // Consume the timing prefix: empty segments are skipped, timestamp and
        // block-number deltas accumulate until the first message-bearing
        // segment. A delta that fails to decode is skipped rather than fatal.
        let mut segment_num = self.backend.get_position_within_message();
        let mut timestamp = 0u64;
        let mut block_number = 0u64;
        while (segment_num as usize) < seq_msg.segments.len() {
            let segment = &seq_msg.segments[segment_num as usize];
            if segment.is_empty() {
                segment_num += 1;
                continue;
            }
            let kind = segment[0];
            if kind != SEGMENT_KIND_ADVANCE_TIMESTAMP
                && kind != SEGMENT_KIND_ADVANCE_L1_BLOCK_NUMBER
            {
                break;
            }
            let mut payload = &segment[1..];
            match u64::decode(&mut payload) {
                Ok(advancing) if kind == SEGMENT_KIND_ADVANCE_TIMESTAMP => {
                    timestamp = timestamp.saturating_add(advancing);
                }
                Ok(advancing) => {
                    block_number = block_number.saturating_add(advancing);
                }
                Err(err) => {
                    warn!(segment_num, %err, "error parsing advancing segment");
                }
            }
            segment_num += 1;
        }

        let timestamp = clamp(timestamp, seq_msg.min_timestamp, seq_msg.max_timestamp);
        let block_number = clamp(block_number, seq_msg.min_l1_block, seq_msg.max_l1_block);

        if segment_num as usize >= seq_msg.segments.len() {
            // Segments are exhausted; any remaining delayed quota drains one
            // message per call before the batch itself is done.
            if self.delayed_messages_read < seq_msg.after_delayed_messages {
                let end_of_message =
                    self.delayed_messages_read + 1 >= seq_msg.after_delayed_messages;
                self.advance_action = if end_of_message {
                    AdvanceAction::Message
                } else {
                    AdvanceAction::DelayedMessage
                };
                let message = self.read_delayed()?;
                return Ok(MessageWithMetadata {
                    message,
                    must_end_block: end_of_message,
                    delayed_messages_read: self.delayed_messages_read + 1,
                });
            }
            self.advance_action = AdvanceAction::Message;
            return Err(MultiplexerError::EndOfSequencerMessage {
                segments: seq_msg.segments.len(),
            });
        }

        let end_of_message = segment_num + 1 >= seq_msg.segments.len() as u64;
        if end_of_message {
            self.advance_action = AdvanceAction::Message;
        } else {
            self.advance_action = AdvanceAction::Segment;
            self.advance_segment_to = segment_num + 1;
        }

        let segment = &seq_msg.segments[segment_num as usize];
        if segment.is_empty() {
            return Err(MultiplexerError::EmptySegment);
        }
        match segment[0] {
            SEGMENT_KIND_L2_MESSAGE => {
                let mut request_id = B256::ZERO;
                if segment.len() < 2 || segment[1] != L2_MESSAGE_KIND_SIGNED_TX {
                    request_id.0[0] = 1 << 6;
                    request_id.0[16..24].copy_from_slice(&position.to_be_bytes());
                    request_id.0[24..32].copy_from_slice(&segment_num.to_be_bytes());
                }
                let header = L1IncomingMessageHeader {
                    kind: L1_MESSAGE_TYPE_L2_MESSAGE,
                    sender: SEQUENCER_ADDRESS,
                    block_number: u64_to_hash(block_number),
                    timestamp: u64_to_hash(timestamp),
                    request_id,
                    gas_price_l1: B256::ZERO,
                };
                Ok(MessageWithMetadata {
                    message: L1IncomingMessage {
                        header,
                        l2msg: Bytes::copy_from_slice(&segment[1..]),
                    },
                    must_end_block: end_of_message,
                    delayed_messages_read: self.delayed_messages_read,
                })
            }
            SEGMENT_KIND_DELAYED_MESSAGES => {
                let mut payload = &segment[1..];
                let reading = u64::decode(&mut payload)
                    .map_err(MultiplexerError::MalformedDelayedSegment)?;
                // The target is re-derived from the current read count on every
                // call, so it is clamped to the batch quota; the final read of
                // the quota ends the segment instead of overshooting it.
                let new_read = self
                    .delayed_messages_read
                    .saturating_add(reading)
                    .min(seq_msg.after_delayed_messages);
                if new_read <= self.delayed_messages_read {
                    return Err(MultiplexerError::BadDelayedCount);
                }
                let end_of_segment = self.delayed_messages_read + 1 >= new_read;
                if !end_of_segment {
                    self.advance_action = AdvanceAction::DelayedMessage;
                }
                let message = self.read_delayed()?;
                Ok(MessageWithMetadata {
                    message,
                    must_end_block: end_of_segment,
                    delayed_messages_read: self.delayed_messages_read + 1,
                })
            }
            SEGMENT_KIND_ADVANCE_TIMESTAMP | SEGMENT_KIND_ADVANCE_L1_BLOCK_NUMBER => {
                Err(MultiplexerError::UnexpectedAdvance)
            }
            kind => Err(MultiplexerError::UnknownSegmentKind(kind)),
        }
    }

    /// Applies the action recorded by the most recent [`Self::peek`], peeking
    /// first if none is recorded. Panics if no action can be derived or if a
    /// segment advance would move backwards; both indicate a bug in the
    /// driving loop rather than bad input.
    pub fn advance(&mut self) {
        if self.advance_action == AdvanceAction::Unknown {
            let _ = self.peek();
            if self.advance_action == AdvanceAction::Unknown {
                panic!("failed to derive an advance action");
            }
        }
        match self.advance_action {
            AdvanceAction::DelayedMessage => {
                self.delayed_messages_read += 1;
            }
            AdvanceAction::Segment => {
                let current = self.backend.get_position_within_message();
                if self.advance_segment_to <= current {
                    panic!(
                        "attempted to advance to segment {} at or before position {current}",
                        self.advance_segment_to
                    );
                }
                self.backend.set_position_within_message(self.advance_segment_to);
            }
            AdvanceAction::Message => {
                // A drained batch settles the delayed counter before the
                // cursor moves on, so its final delayed read cannot reappear
                // under the next batch's quota.
                if let Some(seq_msg) = &self.sequencer_message_cache {
                    self.delayed_messages_read = self
                        .delayed_messages_read
                        .max(seq_msg.after_delayed_messages);
                }
                self.backend.advance_sequencer_inbox();
                self.sequencer_message_cache = None;
                self.sequencer_message_cache_position = 0;
            }
            AdvanceAction::Unknown => unreachable!(),
        }
        self.advance_action = AdvanceAction::Unknown;
        self.advance_segment_to = 0;
    }

    fn read_delayed(&mut self) -> Result<L1IncomingMessage, MultiplexerError> {
        let seq_num = self.delayed_messages_read;
        let raw = self
            .backend
            .read_delayed_inbox(seq_num)
            .map_err(MultiplexerError::Backend)?;
        parse_incoming_l1_message(&raw).map_err(|err| MultiplexerError::DelayedParse {
            seq_num,
            partial: err.partial,
            source: err.source,
        })
    }
}

fn u64_to_hash(value: u64) -> B256 {
    B256::left_padding_from(&value.to_be_bytes())
}

fn clamp(value: u64, min: u64, max: u64) -> u64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
