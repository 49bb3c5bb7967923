// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Abstraction
//!
//! Platform-agnostic contract the engine requires from a BLE stack. The
//! engine is agnostic to the radio's framing: it assumes the transport
//! delivers whole envelope byte sequences atomically (one `send` call
//! corresponds to one inbound-bytes notification at the destination).
//!
//! Discovery, connection-state, and inbound-bytes notifications flow the
//! other way: the platform wires them to the engine's hook methods
//! (`handle_discovered`, `handle_state_change`, `ingest_bytes`).
//!
//! # Synchronous Interface
//!
//! Like the rest of the core, this trait is synchronous; platform
//! implementations may run an async radio stack internally and expose a
//! blocking facade here. `connect` carries its own internal timeout
//! ([`CONNECT_TIMEOUT_MS`]) and fails with `ConnectTimeout` rather than
//! blocking indefinitely.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::message::PeerId;

/// Connection attempt timeout (3 s).
pub const CONNECT_TIMEOUT_MS: u64 = 3_000;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection attempt to {0} timed out")]
    ConnectTimeout(PeerId),
    #[error("peer {0} is not connected")]
    NotConnected(PeerId),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("scan failed: {0}")]
    ScanFailed(String),
}

/// Narrow contract the engine consumes from a BLE library.
pub trait MeshTransport: Send {
    /// Starts scanning for nearby nodes. Idempotent.
    fn start_scan(&mut self) -> TransportResult<()>;

    /// Stops an active scan. Idempotent, best-effort.
    fn stop_scan(&mut self) -> TransportResult<()>;

    /// Connects to a discovered peer, with an internal 3 s timeout.
    fn connect(&mut self, peer_id: &str) -> TransportResult<()>;

    /// Disconnects from a peer. Safe to call when not connected.
    fn disconnect(&mut self, peer_id: &str) -> TransportResult<()>;

    /// Writes one whole envelope to the peer's RX endpoint. No ACK.
    fn send(&mut self, peer_id: &str, bytes: &[u8]) -> TransportResult<()>;

    /// Addresses of all currently connected peers.
    fn connected_peers(&self) -> Vec<PeerId>;
}

/// In-memory transport for tests.
///
/// Records every outbound frame and supports failure injection, mirroring
/// the shape of a real BLE central: connections are tracked as a set, sends
/// to unconnected peers fail.
#[derive(Debug, Default)]
pub struct MockTransport {
    connected: BTreeSet<PeerId>,
    scanning: bool,
    sent: Vec<(PeerId, Vec<u8>)>,
    fail_sends_to: HashSet<PeerId>,
    fail_next_sends: u32,
    refuse_connect: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` send calls fail regardless of target.
    pub fn fail_next_sends(&mut self, n: u32) {
        self.fail_next_sends = n;
    }

    /// Makes every send to `peer_id` fail until cleared.
    pub fn fail_sends_to(&mut self, peer_id: &str) {
        self.fail_sends_to.insert(peer_id.to_string());
    }

    /// Clears a per-peer send failure.
    pub fn heal_sends_to(&mut self, peer_id: &str) {
        self.fail_sends_to.remove(peer_id);
    }

    /// Makes connection attempts time out.
    pub fn refuse_connections(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Drains and returns all recorded outbound frames.
    pub fn take_sent(&mut self) -> Vec<(PeerId, Vec<u8>)> {
        std::mem::take(&mut self.sent)
    }

    /// True while a scan is active.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }
}

impl MeshTransport for MockTransport {
    fn start_scan(&mut self) -> TransportResult<()> {
        self.scanning = true;
        Ok(())
    }

    fn stop_scan(&mut self) -> TransportResult<()> {
        self.scanning = false;
        Ok(())
    }

    fn connect(&mut self, peer_id: &str) -> TransportResult<()> {
        if self.refuse_connect {
            return Err(TransportError::ConnectTimeout(peer_id.to_string()));
        }
        self.connected.insert(peer_id.to_string());
        Ok(())
    }

    fn disconnect(&mut self, peer_id: &str) -> TransportResult<()> {
        self.connected.remove(peer_id);
        Ok(())
    }

    fn send(&mut self, peer_id: &str, bytes: &[u8]) -> TransportResult<()> {
        if !self.connected.contains(peer_id) {
            return Err(TransportError::NotConnected(peer_id.to_string()));
        }
        if self.fail_next_sends > 0 {
            self.fail_next_sends -= 1;
            return Err(TransportError::SendFailed("injected failure".into()));
        }
        if self.fail_sends_to.contains(peer_id) {
            return Err(TransportError::SendFailed("injected failure".into()));
        }
        self.sent.push((peer_id.to_string(), bytes.to_vec()));
        Ok(())
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        self.connected.iter().cloned().collect()
    }
}
