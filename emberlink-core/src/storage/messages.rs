// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message history storage operations.
//!
//! Bodies are encrypted at rest; routing columns stay plain so history can
//! be queried per conversation without decrypting everything.

use rusqlite::params;

use crate::message::{Message, MessageDirection, MessageStatus};

use super::{Storage, StorageError};

impl Storage {
    // === Message History Operations ===

    /// Persists a message record.
    pub fn store_message(&self, message: &Message) -> Result<(), StorageError> {
        let body_encrypted = self.seal_blob(message.text.as_bytes())?;

        self.conn.execute(
            "INSERT OR REPLACE INTO messages
             (message_id, peer_id, body_encrypted, timestamp, direction, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.peer_id,
                body_encrypted,
                message.timestamp as i64,
                message.direction.as_str(),
                message.status.as_str(),
            ],
        )?;

        Ok(())
    }

    /// Updates the delivery status of a sent message.
    ///
    /// Returns false if no such message exists.
    pub fn update_message_status(
        &self,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<bool, StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE messages SET status = ?1 WHERE message_id = ?2",
            params![status.as_str(), message_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Loads the conversation history with one peer, oldest first.
    pub fn load_messages(&self, peer_id: &str) -> Result<Vec<Message>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, peer_id, body_encrypted, timestamp, direction, status
             FROM messages WHERE peer_id = ?1 ORDER BY timestamp, message_id",
        )?;

        let rows = stmt.query_map(params![peer_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, peer, body_blob, timestamp, direction, status) = row?;
            messages.push(self.row_to_message(id, peer, &body_blob, timestamp, &direction, &status)?);
        }
        Ok(messages)
    }

    /// Loads a single message by id.
    pub fn load_message(&self, message_id: &str) -> Result<Option<Message>, StorageError> {
        let result = self.conn.query_row(
            "SELECT message_id, peer_id, body_encrypted, timestamp, direction, status
             FROM messages WHERE message_id = ?1",
            params![message_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        );

        match result {
            Ok((id, peer, body_blob, timestamp, direction, status)) => Ok(Some(
                self.row_to_message(id, peer, &body_blob, timestamp, &direction, &status)?,
            )),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    fn row_to_message(
        &self,
        id: String,
        peer_id: String,
        body_blob: &[u8],
        timestamp: i64,
        direction: &str,
        status: &str,
    ) -> Result<Message, StorageError> {
        let body = self.open_blob(body_blob)?;
        let text = String::from_utf8(body)
            .map_err(|_| StorageError::Corrupt("message body is not UTF-8".into()))?;

        Ok(Message {
            id,
            peer_id,
            text,
            timestamp: timestamp as u64,
            direction: MessageDirection::parse(direction)
                .ok_or_else(|| StorageError::Corrupt(format!("bad direction '{direction}'")))?,
            status: MessageStatus::parse(status)
                .ok_or_else(|| StorageError::Corrupt(format!("bad status '{status}'")))?,
        })
    }
}
