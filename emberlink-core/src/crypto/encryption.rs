// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (XChaCha20-Poly1305)
//!
//! Authenticated encryption for message payloads. The mesh envelope carries
//! nonce, tag, and ciphertext as separate fields, so this module produces
//! and consumes detached parts rather than a self-framing blob.
//!
//! Parameters: 32-byte key, 24-byte nonce, 16-byte tag. A fresh random nonce
//! is drawn from the OS RNG on every call; callers never supply one.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::XChaCha20Poly1305;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

/// Encryption error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Authentication failed: data may be corrupted or wrong key")]
    AuthenticationFailed,
    #[error("Nonce must be 24 bytes")]
    BadNonceLength,
    #[error("Authentication tag must be 16 bytes")]
    BadTagLength,
}

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
pub const NONCE_SIZE: usize = 24;
/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// 256-bit symmetric encryption key.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Generates a new random symmetric key.
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let key = ring::rand::generate::<[u8; 32]>(&rng)
            .expect("System RNG should not fail")
            .expose();
        SymmetricKey { bytes: key }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SymmetricKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// The detached parts of one encrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Random per-message nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// Poly1305 authentication tag.
    pub tag: [u8; TAG_SIZE],
    /// Ciphertext without the tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypts a plaintext with a fresh random nonce.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<EncryptedPayload, EncryptionError> {
    let rng = SystemRandom::new();

    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill(&mut nonce)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = chacha20poly1305::XNonce::from_slice(&nonce);

    // The aead crate appends the 16-byte tag to the ciphertext; split it off.
    let mut sealed = cipher
        .encrypt(xnonce, plaintext)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    if sealed.len() < TAG_SIZE {
        return Err(EncryptionError::EncryptionFailed);
    }
    let tag_bytes = sealed.split_off(sealed.len() - TAG_SIZE);
    let tag: [u8; TAG_SIZE] = tag_bytes
        .as_slice()
        .try_into()
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    Ok(EncryptedPayload {
        nonce,
        tag,
        ciphertext: sealed,
    })
}

/// Decrypts detached parts back into the plaintext.
///
/// Any authentication failure (wrong key, tampered ciphertext, tampered tag)
/// maps to the same `AuthenticationFailed` error.
pub fn decrypt(
    key: &SymmetricKey,
    nonce: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    if nonce.len() != NONCE_SIZE {
        return Err(EncryptionError::BadNonceLength);
    }
    if tag.len() != TAG_SIZE {
        return Err(EncryptionError::BadTagLength);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = chacha20poly1305::XNonce::from_slice(nonce);

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    cipher
        .decrypt(xnonce, sealed.as_slice())
        .map_err(|_| EncryptionError::AuthenticationFailed)
}
