// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Envelope
//!
//! The wire record wrapping one encrypted message plus routing metadata.
//! Envelopes are ephemeral: built on send or relay, discarded after
//! transmission. Only the decrypted message is ever persisted.

use uuid::Uuid;

use super::codec::CodecError;

/// Wire protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Hop budget assigned to freshly sent messages.
pub const INITIAL_TTL: u8 = 10;

/// Semantic ttl cap. The wire field is one byte, so 0-255 is enforced by the
/// type; anything above this bound claims an absurd hop budget and is
/// treated as malformed.
pub const MAX_TTL: u8 = 64;

/// Maximum nonce length on the wire.
pub const MAX_NONCE_LEN: usize = 1024;

/// Maximum tag length on the wire.
pub const MAX_TAG_LEN: usize = 1024;

/// Maximum ciphertext length on the wire (10 MiB).
pub const MAX_PAYLOAD_LEN: usize = 10 * 1024 * 1024;

/// Hex length of the sender/recipient id fields (8 bytes on the wire).
pub const NODE_ID_HEX_LEN: usize = 16;

/// Envelope wrapping one encrypted message on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Protocol version for compatibility checking.
    pub version: u8,
    /// Unique message ID (UUID v4, hyphenated form in memory).
    pub message_id: String,
    /// Sender node id: 16 hex chars, 8 bytes on the wire.
    pub sender_id: String,
    /// Recipient node id: 16 hex chars, 8 bytes on the wire.
    pub recipient_id: String,
    /// Milliseconds since the Unix epoch at composition time.
    pub timestamp: u64,
    /// Remaining hop budget; decremented on each relay.
    pub ttl: u8,
    /// AEAD nonce.
    pub nonce: Vec<u8>,
    /// AEAD authentication tag.
    pub tag: Vec<u8>,
    /// Encrypted message text.
    pub ciphertext: Vec<u8>,
}

impl MessageEnvelope {
    /// Checks the structural invariants shared by both codec directions and
    /// by the receive path's semantic gate.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.version != PROTOCOL_VERSION {
            return Err(CodecError::UnsupportedVersion(self.version));
        }
        if Uuid::parse_str(&self.message_id).is_err() {
            return Err(CodecError::InvalidMessageId);
        }
        if !is_node_id(&self.sender_id) || !is_node_id(&self.recipient_id) {
            return Err(CodecError::InvalidNodeId);
        }
        if self.ttl > MAX_TTL {
            return Err(CodecError::InvalidTtl(self.ttl));
        }
        if self.nonce.len() > MAX_NONCE_LEN
            || self.tag.len() > MAX_TAG_LEN
            || self.ciphertext.len() > MAX_PAYLOAD_LEN
        {
            return Err(CodecError::FieldTooLarge);
        }
        Ok(())
    }

    /// Returns a copy of this envelope with the hop budget decremented.
    ///
    /// Callers must check `ttl > 0` first; a zero-ttl envelope is never
    /// relayed.
    pub fn next_hop(&self) -> MessageEnvelope {
        debug_assert!(self.ttl > 0, "next_hop on an exhausted envelope");
        MessageEnvelope {
            ttl: self.ttl.saturating_sub(1),
            ..self.clone()
        }
    }

    /// A short prefix of the message id for trace events.
    pub fn id_prefix(&self) -> String {
        self.message_id.chars().take(8).collect()
    }
}

/// True if `id` is a well-formed 16-char lowercase hex node id.
fn is_node_id(id: &str) -> bool {
    id.len() == NODE_ID_HEX_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
