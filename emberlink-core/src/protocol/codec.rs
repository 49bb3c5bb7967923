// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Envelope Codec
//!
//! Serializes and deserializes [`MessageEnvelope`] values. Multi-byte
//! integers are big-endian with no padding. Serialization is deterministic:
//! equal envelopes produce byte-identical output, and the output length is
//! exactly `FIXED_HEADER_LEN + 2 + nonce + 2 + tag + 4 + ciphertext`.
//!
//! Malformed inbound bytes are an expected condition on a lossy radio link;
//! every failure mode maps to a typed [`CodecError`] so the receive path can
//! drop and trace without panicking.

use thiserror::Error;
use uuid::Uuid;

use super::envelope::{MessageEnvelope, NODE_ID_HEX_LEN};

/// Length of the fixed-size header portion:
/// version (1) + message_id (16) + sender_id (8) + recipient_id (8)
/// + timestamp (8) + ttl (1).
pub const FIXED_HEADER_LEN: usize = 1 + 16 + 8 + 8 + 8 + 1;

/// Byte offset of the timestamp field within a serialized envelope.
pub const TIMESTAMP_OFFSET: usize = 1 + 16 + 8 + 8;

/// Codec error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("envelope shorter than its fixed header")]
    ShortHeader,
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("declared field length overruns the buffer")]
    LengthOverrun,
    #[error("trailing bytes after the envelope")]
    LengthMismatch,
    #[error("ttl {0} exceeds the hop budget cap")]
    InvalidTtl(u8),
    #[error("variable-length field exceeds its size cap")]
    FieldTooLarge,
    #[error("message id is not a valid UUID")]
    InvalidMessageId,
    #[error("node id is not 16 lowercase hex characters")]
    InvalidNodeId,
}

/// Serializes an envelope into wire bytes.
///
/// Fails only when the envelope violates structural invariants (malformed
/// ids, oversized fields); see [`MessageEnvelope::validate`].
pub fn serialize(envelope: &MessageEnvelope) -> Result<Vec<u8>, CodecError> {
    envelope.validate()?;

    let message_id = Uuid::parse_str(&envelope.message_id)
        .map_err(|_| CodecError::InvalidMessageId)?;
    let sender = decode_node_id(&envelope.sender_id)?;
    let recipient = decode_node_id(&envelope.recipient_id)?;

    let total = FIXED_HEADER_LEN
        + 2
        + envelope.nonce.len()
        + 2
        + envelope.tag.len()
        + 4
        + envelope.ciphertext.len();

    let mut out = Vec::with_capacity(total);
    out.push(envelope.version);
    out.extend_from_slice(message_id.as_bytes());
    out.extend_from_slice(&sender);
    out.extend_from_slice(&recipient);
    out.extend_from_slice(&envelope.timestamp.to_be_bytes());
    out.push(envelope.ttl);
    out.extend_from_slice(&(envelope.nonce.len() as u16).to_be_bytes());
    out.extend_from_slice(&envelope.nonce);
    out.extend_from_slice(&(envelope.tag.len() as u16).to_be_bytes());
    out.extend_from_slice(&envelope.tag);
    out.extend_from_slice(&(envelope.ciphertext.len() as u32).to_be_bytes());
    out.extend_from_slice(&envelope.ciphertext);

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

/// Deserializes wire bytes into an envelope.
///
/// Rejects trailing bytes: the consumed length must equal the input length.
pub fn deserialize(bytes: &[u8]) -> Result<MessageEnvelope, CodecError> {
    let mut reader = Reader::new(bytes);

    let version = reader.read_u8()?;
    if version != super::envelope::PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let message_id = Uuid::from_bytes(reader.read_array::<16>()?);
    let sender_id = hex::encode(reader.read_array::<8>()?);
    let recipient_id = hex::encode(reader.read_array::<8>()?);
    let timestamp = u64::from_be_bytes(reader.read_array::<8>()?);
    let ttl = reader.read_u8()?;

    let nonce_len = u16::from_be_bytes(reader.read_array::<2>()?) as usize;
    if nonce_len > super::envelope::MAX_NONCE_LEN {
        return Err(CodecError::FieldTooLarge);
    }
    let nonce = reader.read_vec(nonce_len)?;

    let tag_len = u16::from_be_bytes(reader.read_array::<2>()?) as usize;
    if tag_len > super::envelope::MAX_TAG_LEN {
        return Err(CodecError::FieldTooLarge);
    }
    let tag = reader.read_vec(tag_len)?;

    let payload_len = u32::from_be_bytes(reader.read_array::<4>()?) as usize;
    if payload_len > super::envelope::MAX_PAYLOAD_LEN {
        return Err(CodecError::FieldTooLarge);
    }
    let ciphertext = reader.read_vec(payload_len)?;

    if !reader.is_empty() {
        return Err(CodecError::LengthMismatch);
    }

    let envelope = MessageEnvelope {
        version,
        message_id: message_id.to_string(),
        sender_id,
        recipient_id,
        timestamp,
        ttl,
        nonce,
        tag,
        ciphertext,
    };
    envelope.validate()?;
    Ok(envelope)
}

/// Decodes a 16-hex-char node id into its 8 wire bytes.
fn decode_node_id(id: &str) -> Result<[u8; 8], CodecError> {
    if id.len() != NODE_ID_HEX_LEN {
        return Err(CodecError::InvalidNodeId);
    }
    let bytes = hex::decode(id).map_err(|_| CodecError::InvalidNodeId)?;
    bytes.try_into().map_err(|_| CodecError::InvalidNodeId)
}

/// Cursor over the input buffer.
///
/// Distinguishes a truncated fixed header (`ShortHeader`) from a declared
/// variable length that runs past the end (`LengthOverrun`).
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        if self.remaining() < 1 {
            return Err(CodecError::ShortHeader);
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.remaining() < N {
            return Err(CodecError::ShortHeader);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        if self.remaining() < len {
            return Err(CodecError::LengthOverrun);
        }
        let out = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::envelope::{INITIAL_TTL, PROTOCOL_VERSION};

    fn sample() -> MessageEnvelope {
        MessageEnvelope {
            version: PROTOCOL_VERSION,
            message_id: "67e55044-10b1-426f-9247-bb680e5fe0c8".into(),
            sender_id: "0011223344556677".into(),
            recipient_id: "8899aabbccddeeff".into(),
            timestamp: 1_700_000_000_000,
            ttl: INITIAL_TTL,
            nonce: vec![9u8; 24],
            tag: vec![7u8; 16],
            ciphertext: b"sealed".to_vec(),
        }
    }

    #[test]
    fn roundtrip() {
        let env = sample();
        let bytes = serialize(&env).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), env);
    }

    #[test]
    fn output_length_is_deterministic() {
        let env = sample();
        let bytes = serialize(&env).unwrap();
        assert_eq!(
            bytes.len(),
            FIXED_HEADER_LEN + 2 + env.nonce.len() + 2 + env.tag.len() + 4 + env.ciphertext.len()
        );
        assert_eq!(bytes, serialize(&env).unwrap());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes.push(0);
        assert_eq!(deserialize(&bytes), Err(CodecError::LengthMismatch));
    }

    #[test]
    fn truncated_header_rejected() {
        let bytes = serialize(&sample()).unwrap();
        assert_eq!(
            deserialize(&bytes[..FIXED_HEADER_LEN - 1]),
            Err(CodecError::ShortHeader)
        );
    }

    #[test]
    fn declared_length_overrun_rejected() {
        let env = sample();
        let mut bytes = serialize(&env).unwrap();
        // Inflate the declared nonce length past the end of the buffer.
        let off = FIXED_HEADER_LEN;
        bytes[off..off + 2].copy_from_slice(&500u16.to_be_bytes());
        assert_eq!(deserialize(&bytes), Err(CodecError::LengthOverrun));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[0] = 2;
        assert_eq!(deserialize(&bytes), Err(CodecError::UnsupportedVersion(2)));
    }
}
