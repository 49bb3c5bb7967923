// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicate-cache snapshot storage operations.
//!
//! The engine snapshots its seen-message set on shutdown so a quick restart
//! does not re-deliver messages still flooding through the mesh. Entries
//! are plain rows; message ids are not sensitive.

use rusqlite::params;

use crate::message::MessageId;

use super::{Storage, StorageError};

impl Storage {
    // === Duplicate Cache Snapshot Operations ===

    /// Replaces the persisted snapshot with the given entries.
    pub fn save_seen_messages(&self, entries: &[(MessageId, u64)]) -> Result<(), StorageError> {
        self.conn.execute_batch("BEGIN TRANSACTION;")?;

        let result = (|| -> Result<(), rusqlite::Error> {
            self.conn.execute("DELETE FROM seen_messages", [])?;
            for (id, seen_at) in entries {
                self.conn.execute(
                    "INSERT OR REPLACE INTO seen_messages (message_id, seen_at) VALUES (?1, ?2)",
                    params![id, *seen_at as i64],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(e) => {
                self.conn.execute_batch("ROLLBACK;")?;
                Err(StorageError::Database(e))
            }
        }
    }

    /// Loads the persisted snapshot.
    pub fn load_seen_messages(&self) -> Result<Vec<(MessageId, u64)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT message_id, seen_at FROM seen_messages")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }
}
