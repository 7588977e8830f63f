use crate::l1::L1IncomingMessage;

/// One replayed message plus the bookkeeping block execution needs: whether
/// the current batch can yield anything after it, and the delayed-inbox read
/// count once it has been consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageWithMetadata {
    pub message: L1IncomingMessage,
    pub must_end_block: bool,
    pub delayed_messages_read: u64,
}
