// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Versioned schema migrations with transactional safety. The runner tracks
//! applied versions in a `schema_version` table and runs pending migrations
//! in order within a single transaction.

use rusqlite::Connection;

use super::StorageError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// The SQL this migration executes.
    pub sql: &'static str,
}

/// All migrations, in order.
pub fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        name: "initial_schema",
        sql: "CREATE TABLE IF NOT EXISTS identity (
                  id INTEGER PRIMARY KEY CHECK (id = 1),
                  public_key BLOB NOT NULL,
                  secret_encrypted BLOB NOT NULL,
                  created_at INTEGER NOT NULL
              );
              CREATE TABLE IF NOT EXISTS messages (
                  message_id TEXT PRIMARY KEY,
                  peer_id TEXT NOT NULL,
                  body_encrypted BLOB NOT NULL,
                  timestamp INTEGER NOT NULL,
                  direction TEXT NOT NULL,
                  status TEXT NOT NULL
              );
              CREATE INDEX IF NOT EXISTS idx_messages_peer
                  ON messages(peer_id, timestamp);
              CREATE TABLE IF NOT EXISTS seen_messages (
                  message_id TEXT PRIMARY KEY,
                  seen_at INTEGER NOT NULL
              );
              CREATE TABLE IF NOT EXISTS peer_trust (
                  peer_id TEXT PRIMARY KEY,
                  verified INTEGER NOT NULL,
                  updated_at INTEGER NOT NULL
              );",
    }]
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema
    /// version. If any migration fails, all changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Migration v{} ({}) failed: {}",
                    migration.version, migration.name, e
                )));
            }

            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system time before UNIX epoch")
                .as_secs();
            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now as i64],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Database(e));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the highest applied migration version (0 if none).
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let version: Option<i64> = conn.query_row(
            "SELECT MAX(version) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version.unwrap_or(0) as u32)
    }
}
