// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Local SQLite storage for the identity keypair, message history, the
//! duplicate-cache snapshot, and trust decisions. Sensitive columns
//! (the identity secret, message bodies) are encrypted at the application
//! level with a caller-supplied key before they reach the database.

pub mod dedup;
pub mod error;
pub mod identity;
pub mod messages;
pub mod migration;
pub mod trust;

pub use error::StorageError;

use rusqlite::Connection;
use std::path::Path;

use crate::crypto::{self, SymmetricKey};

/// Schema tag prefixed to every encrypted blob, so the at-rest format can
/// evolve independently of the database schema.
const BLOB_FORMAT_V1: u8 = 0x01;

/// SQLite-based storage implementation.
pub struct Storage {
    conn: Connection,
    /// Encryption key for sensitive columns, derived by the caller.
    pub(crate) encryption_key: SymmetricKey,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(
        path: P,
        encryption_key: SymmetricKey,
    ) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Storage {
            conn,
            encryption_key,
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory(encryption_key: SymmetricKey) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage {
            conn,
            encryption_key,
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    /// Encrypts a value into a self-framing at-rest blob:
    /// `format_tag (1) || nonce (24) || tag (16) || ciphertext`.
    pub(crate) fn seal_blob(&self, plaintext: &[u8]) -> Result<Vec<u8>, StorageError> {
        let sealed = crypto::encrypt(&self.encryption_key, plaintext)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;

        let mut blob =
            Vec::with_capacity(1 + sealed.nonce.len() + sealed.tag.len() + sealed.ciphertext.len());
        blob.push(BLOB_FORMAT_V1);
        blob.extend_from_slice(&sealed.nonce);
        blob.extend_from_slice(&sealed.tag);
        blob.extend_from_slice(&sealed.ciphertext);
        Ok(blob)
    }

    /// Decrypts a blob produced by [`seal_blob`](Self::seal_blob).
    pub(crate) fn open_blob(&self, blob: &[u8]) -> Result<Vec<u8>, StorageError> {
        const NONCE: usize = crypto::encryption::NONCE_SIZE;
        const TAG: usize = crypto::encryption::TAG_SIZE;

        if blob.len() < 1 + NONCE + TAG {
            return Err(StorageError::Corrupt("encrypted blob too short".into()));
        }
        if blob[0] != BLOB_FORMAT_V1 {
            return Err(StorageError::Corrupt(format!(
                "unknown blob format tag {:#04x}",
                blob[0]
            )));
        }

        let nonce = &blob[1..1 + NONCE];
        let tag = &blob[1 + NONCE..1 + NONCE + TAG];
        let ciphertext = &blob[1 + NONCE + TAG..];

        crypto::decrypt(&self.encryption_key, nonce, tag, ciphertext)
            .map_err(|e| StorageError::Encryption(e.to_string()))
    }
}
