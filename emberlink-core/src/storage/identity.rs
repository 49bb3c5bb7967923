// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity storage operations.

use rusqlite::params;

use super::{Storage, StorageError};

impl Storage {
    // === Identity Operations ===

    /// Saves the identity keypair. The secret half is encrypted at rest.
    pub fn store_identity(
        &self,
        public_key: &[u8; 32],
        secret_key: &[u8; 32],
    ) -> Result<(), StorageError> {
        let secret_encrypted = self.seal_blob(secret_key)?;

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_secs();

        self.conn.execute(
            "INSERT OR REPLACE INTO identity (id, public_key, secret_encrypted, created_at)
             VALUES (1, ?1, ?2, ?3)",
            params![public_key.as_slice(), secret_encrypted, now as i64],
        )?;

        Ok(())
    }

    /// Loads the identity keypair, if one has been persisted.
    ///
    /// Returns `(public_key, secret_key)`.
    pub fn load_identity(&self) -> Result<Option<([u8; 32], [u8; 32])>, StorageError> {
        let result = self.conn.query_row(
            "SELECT public_key, secret_encrypted FROM identity WHERE id = 1",
            [],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)),
        );

        match result {
            Ok((public_blob, secret_blob)) => {
                let public_key: [u8; 32] = public_blob
                    .try_into()
                    .map_err(|_| StorageError::Corrupt("public key is not 32 bytes".into()))?;
                let secret = self.open_blob(&secret_blob)?;
                let secret_key: [u8; 32] = secret
                    .try_into()
                    .map_err(|_| StorageError::Corrupt("secret key is not 32 bytes".into()))?;
                Ok(Some((public_key, secret_key)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Checks if an identity exists.
    pub fn has_identity(&self) -> Result<bool, StorageError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM identity WHERE id = 1", [], |row| {
                    row.get(0)
                })?;
        Ok(count > 0)
    }
}
