use alloy_primitives::Bytes;
use arbmux_inbox::batch::{
    parse_sequencer_message, BatchError, SequencerMessage, MAX_DECOMPRESSED_LEN,
};
use brotli::CompressorWriter;
use std::io::Write;

fn header(min_ts: u64, max_ts: u64, min_l1: u64, max_l1: u64, after_delayed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(40);
    out.extend_from_slice(&min_ts.to_be_bytes());
    out.extend_from_slice(&max_ts.to_be_bytes());
    out.extend_from_slice(&min_l1.to_be_bytes());
    out.extend_from_slice(&max_l1.to_be_bytes());
    out.extend_from_slice(&after_delayed.to_be_bytes());
    out
}

fn compress(payload: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    {
        let mut w = CompressorWriter::new(&mut compressed, 4096, 6, 22);
        w.write_all(payload).unwrap();
        w.flush().unwrap();
    }
    compressed
}

fn segment(kind: u8, payload: &[u8]) -> Bytes {
    let mut v = Vec::with_capacity(1 + payload.len());
    v.push(kind);
    v.extend_from_slice(payload);
    Bytes::from(v)
}

#[test]
fn short_header_is_rejected() {
    assert!(matches!(
        parse_sequencer_message(&[]),
        Err(BatchError::ShortHeader(0))
    ));
    assert!(matches!(
        parse_sequencer_message(&[0u8; 39]),
        Err(BatchError::ShortHeader(39))
    ));
}

#[test]
fn header_fields_decode_big_endian() {
    let mut data = header(10, 20, 100, 200, 7);
    let segments: Vec<Bytes> = vec![segment(0, &[0xAA, 0xBB, 0xCC])];
    data.extend_from_slice(&compress(&alloy_rlp::encode(&segments)));

    let parsed = parse_sequencer_message(&data).expect("parse ok");
    assert_eq!(parsed.min_timestamp, 10);
    assert_eq!(parsed.max_timestamp, 20);
    assert_eq!(parsed.min_l1_block, 100);
    assert_eq!(parsed.max_l1_block, 200);
    assert_eq!(parsed.after_delayed_messages, 7);
    assert_eq!(parsed.segments, segments);
}

#[test]
fn encode_round_trips_through_the_parser() {
    let messages = [
        SequencerMessage {
            min_timestamp: 0,
            max_timestamp: 0,
            min_l1_block: 0,
            max_l1_block: 0,
            after_delayed_messages: 2,
            segments: vec![],
        },
        SequencerMessage {
            min_timestamp: 5,
            max_timestamp: 9,
            min_l1_block: 1,
            max_l1_block: 1,
            after_delayed_messages: 0,
            segments: vec![segment(0, &[0xAA, 0xBB])],
        },
        SequencerMessage {
            min_timestamp: 0,
            max_timestamp: u64::MAX,
            min_l1_block: 0,
            max_l1_block: u64::MAX,
            after_delayed_messages: 11,
            segments: vec![
                segment(2, &alloy_rlp::encode(&3u64)),
                Bytes::new(),
                segment(3, &alloy_rlp::encode(&7u64)),
                segment(0, b"payload with some length to it"),
                segment(1, &alloy_rlp::encode(&11u64)),
            ],
        },
    ];
    for message in messages {
        let encoded = message.encode().unwrap();
        let decoded = parse_sequencer_message(&encoded).expect("parse ok");
        assert_eq!(decoded, message);
    }
}

#[test]
fn malformed_segment_rlp_degrades_to_an_empty_batch() {
    // 0xff opens a long list whose length bytes never arrive
    let mut data = header(1, 2, 3, 4, 5);
    data.extend_from_slice(&compress(&[0xff, 0x01]));

    let parsed = parse_sequencer_message(&data).expect("parse ok");
    assert_eq!(parsed.after_delayed_messages, 5);
    assert!(parsed.segments.is_empty());
}

#[test]
fn oversized_decompression_is_rejected() {
    let mut data = header(0, 0, 0, 0, 0);
    data.extend_from_slice(&compress(&vec![0u8; MAX_DECOMPRESSED_LEN + 1]));

    assert!(matches!(
        parse_sequencer_message(&data),
        Err(BatchError::DecompressedTooLarge)
    ));
}
