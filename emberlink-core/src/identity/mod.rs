// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Management Module
//!
//! The node's long-lived X25519 identity keypair: generated on first run,
//! persisted encrypted at rest, and never rotated without user action. The
//! fingerprint of the public key is what peers verify out-of-band.

pub mod qr;

pub use qr::FingerprintQr;

use thiserror::Error;

use crate::crypto::{fingerprint, sender_id, IdentityKeyPair, SymmetricKey};
use crate::storage::{Storage, StorageError};

/// Identity-related errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// The local node's identity.
pub struct MeshIdentity {
    keypair: IdentityKeyPair,
    /// Cached wire sender id derived from the public key.
    sender_id: String,
}

impl std::fmt::Debug for MeshIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshIdentity")
            .field("sender_id", &self.sender_id)
            .finish()
    }
}

impl MeshIdentity {
    /// Loads the persisted identity, or generates and persists a new one.
    ///
    /// Idempotent after the first success: subsequent calls load the same
    /// keypair.
    pub fn load_or_create(storage: &Storage) -> Result<Self, IdentityError> {
        let keypair = match storage.load_identity()? {
            Some((_public, secret)) => IdentityKeyPair::from_bytes(secret),
            None => {
                let keypair = IdentityKeyPair::generate();
                storage.store_identity(&keypair.public_bytes(), &keypair.secret_bytes())?;
                keypair
            }
        };

        let sender_id = sender_id(&keypair.public_bytes());
        Ok(MeshIdentity { keypair, sender_id })
    }

    /// Creates an identity from explicit secret bytes (for tests and
    /// device-provisioning flows).
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let keypair = IdentityKeyPair::from_bytes(secret);
        let sender_id = sender_id(&keypair.public_bytes());
        MeshIdentity { keypair, sender_id }
    }

    /// Returns the public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public_bytes()
    }

    /// Returns the wire sender id of this node.
    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// Returns the fingerprint shown for out-of-band verification.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.keypair.public_bytes())
    }

    /// Builds the QR payload for out-of-band verification.
    pub fn fingerprint_qr(&self) -> FingerprintQr {
        FingerprintQr::new(&self.keypair.public_bytes())
    }

    /// Performs key agreement with a peer's public key.
    pub fn agree(&self, peer_public: &[u8; 32]) -> SymmetricKey {
        self.keypair.agree(peer_public)
    }
}
