// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprints and Node Ids
//!
//! Both identifiers are truncations of the same SHA-512 digest of an
//! identity public key:
//!
//! - **fingerprint**: first 32 hex characters, rendered as a QR code for
//!   out-of-band visual verification.
//! - **sender id**: first 16 hex characters (8 bytes on the wire), used in
//!   envelopes for routing without exposing the full key.
//!
//! Two nodes interoperate only if they agree on this derivation rule.

use ring::digest::{digest, SHA512};

/// Hex length of a fingerprint (32 chars = 16 bytes of digest).
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Hex length of a sender id (16 chars = 8 bytes of digest).
pub const SENDER_ID_HEX_LEN: usize = 16;

/// Computes the fingerprint of a public key.
pub fn fingerprint(public_key: &[u8; 32]) -> String {
    let hash = digest(&SHA512, public_key);
    hex::encode(hash.as_ref())[..FINGERPRINT_HEX_LEN].to_string()
}

/// Derives the 8-byte wire sender id of a public key, as hex.
pub fn sender_id(public_key: &[u8; 32]) -> String {
    let hash = digest(&SHA512, public_key);
    hex::encode(hash.as_ref())[..SENDER_ID_HEX_LEN].to_string()
}

/// Checks a scanned fingerprint against a public key.
///
/// The scanned string is whitespace-trimmed and compared case-insensitively.
/// The comparison itself is constant-time; only the length check can short
/// circuit, and the length of a fingerprint is public.
pub fn verify_fingerprint(scanned: &str, public_key: &[u8; 32]) -> bool {
    let normalized = scanned.trim().to_ascii_lowercase();
    if normalized.len() != FINGERPRINT_HEX_LEN {
        return false;
    }

    let expected = fingerprint(public_key);
    ring::constant_time::verify_slices_are_equal(normalized.as_bytes(), expected.as_bytes())
        .is_ok()
}
