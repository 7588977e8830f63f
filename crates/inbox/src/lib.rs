//! Deterministic reconstruction of the L2 message stream from the sequencer
//! and delayed inboxes.

pub mod batch;
pub mod multiplexer;
