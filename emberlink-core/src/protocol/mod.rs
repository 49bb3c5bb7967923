// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire Protocol
//!
//! The binary envelope format every Emberlink node speaks, and the codec
//! that converts between envelope values and contiguous byte sequences.
//!
//! Layout (all integers big-endian, no padding):
//!
//! ```text
//! version (1) | message_id (16) | sender_id (8) | recipient_id (8)
//! | timestamp (8) | ttl (1) | nonce_len (2) | nonce
//! | tag_len (2) | tag | payload_len (4) | ciphertext
//! ```

pub mod codec;
pub mod envelope;

pub use codec::{deserialize, serialize, CodecError};
pub use envelope::{
    MessageEnvelope, INITIAL_TTL, MAX_NONCE_LEN, MAX_PAYLOAD_LEN, MAX_TAG_LEN, MAX_TTL,
    PROTOCOL_VERSION,
};
