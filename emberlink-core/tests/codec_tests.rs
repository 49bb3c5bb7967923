// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the wire envelope codec: round-trips, determinism, endianness,
//! and every rejection path for malformed inbound bytes.

use emberlink_core::protocol::codec::{
    deserialize, serialize, CodecError, FIXED_HEADER_LEN, TIMESTAMP_OFFSET,
};
use emberlink_core::protocol::envelope::{
    MessageEnvelope, INITIAL_TTL, MAX_NONCE_LEN, MAX_TTL, PROTOCOL_VERSION,
};
use proptest::prelude::*;
use uuid::Uuid;

fn envelope() -> MessageEnvelope {
    MessageEnvelope {
        version: PROTOCOL_VERSION,
        message_id: "67e55044-10b1-426f-9247-bb680e5fe0c8".into(),
        sender_id: "0011223344556677".into(),
        recipient_id: "8899aabbccddeeff".into(),
        timestamp: 1_700_000_000_000,
        ttl: INITIAL_TTL,
        nonce: vec![0xAA; 24],
        tag: vec![0xBB; 16],
        ciphertext: b"the quick brown fox".to_vec(),
    }
}

// === Round-trip and determinism ===

#[test]
fn test_roundtrip_preserves_every_field() {
    let env = envelope();
    let decoded = deserialize(&serialize(&env).unwrap()).unwrap();
    assert_eq!(decoded, env);
}

#[test]
fn test_serialization_is_deterministic() {
    let env = envelope();
    assert_eq!(serialize(&env).unwrap(), serialize(&env).unwrap());
}

#[test]
fn test_reserialize_is_byte_identical() {
    let bytes = serialize(&envelope()).unwrap();
    let reserialized = serialize(&deserialize(&bytes).unwrap()).unwrap();
    assert_eq!(reserialized, bytes);
}

#[test]
fn test_empty_ciphertext_roundtrips() {
    let mut env = envelope();
    env.ciphertext = Vec::new();
    env.nonce = Vec::new();
    env.tag = Vec::new();
    let decoded = deserialize(&serialize(&env).unwrap()).unwrap();
    assert_eq!(decoded, env);
}

// === Endianness ===

#[test]
fn test_timestamp_is_big_endian_on_the_wire() {
    // A timestamp whose byte halves differ, so a little-endian read cannot
    // accidentally agree.
    let mut env = envelope();
    env.timestamp = 0x0102030405060708;
    let bytes = serialize(&env).unwrap();

    let field: [u8; 8] = bytes[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
        .try_into()
        .unwrap();
    assert_eq!(u64::from_be_bytes(field), env.timestamp);
    assert_ne!(u64::from_le_bytes(field), env.timestamp);
}

// === Rejection paths ===

#[test]
fn test_short_header_rejected() {
    let bytes = serialize(&envelope()).unwrap();
    for len in [0, 1, FIXED_HEADER_LEN - 1, FIXED_HEADER_LEN + 1] {
        assert_eq!(
            deserialize(&bytes[..len]),
            Err(CodecError::ShortHeader),
            "prefix of {len} bytes should be rejected as a short header"
        );
    }
}

#[test]
fn test_unsupported_version_rejected() {
    let mut bytes = serialize(&envelope()).unwrap();
    bytes[0] = 0;
    assert_eq!(deserialize(&bytes), Err(CodecError::UnsupportedVersion(0)));
    bytes[0] = 7;
    assert_eq!(deserialize(&bytes), Err(CodecError::UnsupportedVersion(7)));
}

#[test]
fn test_length_overrun_rejected() {
    let mut bytes = serialize(&envelope()).unwrap();
    // Claim a nonce longer than the rest of the buffer.
    bytes[FIXED_HEADER_LEN..FIXED_HEADER_LEN + 2].copy_from_slice(&1000u16.to_be_bytes());
    assert_eq!(deserialize(&bytes), Err(CodecError::LengthOverrun));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = serialize(&envelope()).unwrap();
    bytes.extend_from_slice(&[0, 1, 2]);
    assert_eq!(deserialize(&bytes), Err(CodecError::LengthMismatch));
}

#[test]
fn test_oversized_declared_nonce_rejected() {
    let mut bytes = serialize(&envelope()).unwrap();
    bytes[FIXED_HEADER_LEN..FIXED_HEADER_LEN + 2]
        .copy_from_slice(&((MAX_NONCE_LEN + 1) as u16).to_be_bytes());
    assert_eq!(deserialize(&bytes), Err(CodecError::FieldTooLarge));
}

#[test]
fn test_absurd_ttl_rejected_on_deserialize() {
    let mut bytes = serialize(&envelope()).unwrap();
    // ttl is the last byte of the fixed header.
    bytes[FIXED_HEADER_LEN - 1] = MAX_TTL + 1;
    assert_eq!(
        deserialize(&bytes),
        Err(CodecError::InvalidTtl(MAX_TTL + 1))
    );
}

#[test]
fn test_serialize_rejects_bad_node_id() {
    let mut env = envelope();
    env.sender_id = "not hex at all!!".into();
    assert_eq!(serialize(&env), Err(CodecError::InvalidNodeId));

    let mut env = envelope();
    env.recipient_id = "0011".into();
    assert_eq!(serialize(&env), Err(CodecError::InvalidNodeId));
}

#[test]
fn test_serialize_rejects_bad_message_id() {
    let mut env = envelope();
    env.message_id = "not-a-uuid".into();
    assert_eq!(serialize(&env), Err(CodecError::InvalidMessageId));
}

#[test]
fn test_serialize_rejects_oversized_nonce() {
    let mut env = envelope();
    env.nonce = vec![0; MAX_NONCE_LEN + 1];
    assert_eq!(serialize(&env), Err(CodecError::FieldTooLarge));
}

#[test]
fn test_serialize_rejects_absurd_ttl() {
    let mut env = envelope();
    env.ttl = MAX_TTL + 1;
    assert_eq!(serialize(&env), Err(CodecError::InvalidTtl(MAX_TTL + 1)));
}

// === Property-based round-trips ===

proptest! {
    #[test]
    fn prop_roundtrip(
        id_bytes in any::<u128>(),
        sender in any::<[u8; 8]>(),
        recipient in any::<[u8; 8]>(),
        timestamp in any::<u64>(),
        ttl in 0u8..=MAX_TTL,
        nonce in proptest::collection::vec(any::<u8>(), 0..64),
        tag in proptest::collection::vec(any::<u8>(), 0..64),
        ciphertext in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let env = MessageEnvelope {
            version: PROTOCOL_VERSION,
            message_id: Uuid::from_u128(id_bytes).to_string(),
            sender_id: hex::encode(sender),
            recipient_id: hex::encode(recipient),
            timestamp,
            ttl,
            nonce,
            tag,
            ciphertext,
        };

        let bytes = serialize(&env).unwrap();
        prop_assert_eq!(deserialize(&bytes).unwrap(), env);

        // Truncations never round-trip to success with trailing garbage.
        let mut extended = bytes.clone();
        extended.push(0);
        prop_assert_eq!(deserialize(&extended), Err(CodecError::LengthMismatch));
    }
}
