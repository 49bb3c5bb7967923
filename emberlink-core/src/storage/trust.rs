// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Trust persistence operations.
//!
//! A verified fingerprint is a user decision and must survive restarts,
//! unlike the rest of the peer table which is rebuilt from discovery.

use rusqlite::params;

use super::{Storage, StorageError};

impl Storage {
    // === Trust Operations ===

    /// Persists the trust decision for a peer.
    pub fn store_trust(&self, peer_id: &str, verified: bool) -> Result<(), StorageError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_secs();

        self.conn.execute(
            "INSERT OR REPLACE INTO peer_trust (peer_id, verified, updated_at)
             VALUES (?1, ?2, ?3)",
            params![peer_id, verified as i32, now as i64],
        )?;
        Ok(())
    }

    /// Loads the trust decision for a peer (false if none recorded).
    pub fn load_trust(&self, peer_id: &str) -> Result<bool, StorageError> {
        let result = self.conn.query_row(
            "SELECT verified FROM peer_trust WHERE peer_id = ?1",
            params![peer_id],
            |row| row.get::<_, i32>(0),
        );

        match result {
            Ok(v) => Ok(v != 0),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Removes the trust record for a peer (on explicit peer removal).
    pub fn clear_trust(&self, peer_id: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM peer_trust WHERE peer_id = ?1",
            params![peer_id],
        )?;
        Ok(())
    }
}
