// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer Table
//!
//! Authoritative in-memory directory of known peers: connection liveness,
//! cryptographic state, and trust. All mutation goes through methods here;
//! external code only ever sees immutable snapshots.
//!
//! Per-peer progression: Discovered -> Connected -> KeysExchanged ->
//! Verified. Only `connected` moves backward. `verified` is cleared only
//! when a conflicting key replaces an existing binding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crypto::{sender_id, SymmetricKey};
use crate::message::PeerId;

/// Cryptographic state of a peer.
///
/// A bound public key and its derived shared secret always appear together,
/// so the "key without secret" state is unrepresentable.
#[derive(Debug, Clone)]
pub enum PeerCrypto {
    /// No key exchange has completed yet.
    None,
    /// Key exchange complete.
    Keyed {
        /// The peer's identity public key.
        public_key: [u8; 32],
        /// X25519 shared secret with this peer.
        shared_secret: SymmetricKey,
        /// Cached sender id derived from `public_key`.
        sender_id: String,
    },
}

impl PeerCrypto {
    /// Returns the shared secret, if key exchange has completed.
    pub fn shared_secret(&self) -> Option<&SymmetricKey> {
        match self {
            PeerCrypto::None => None,
            PeerCrypto::Keyed { shared_secret, .. } => Some(shared_secret),
        }
    }

    /// Returns the bound public key, if any.
    pub fn public_key(&self) -> Option<&[u8; 32]> {
        match self {
            PeerCrypto::None => None,
            PeerCrypto::Keyed { public_key, .. } => Some(public_key),
        }
    }

    /// Returns the derived sender id, if a key is bound.
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            PeerCrypto::None => None,
            PeerCrypto::Keyed { sender_id, .. } => Some(sender_id),
        }
    }
}

/// Outcome of a key binding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    /// First key bound for this peer.
    Bound,
    /// The same key was already bound; nothing changed.
    Unchanged,
    /// A different key replaced the previous binding; trust was cleared.
    Replaced,
}

/// One entry of the peer table.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    /// Transport-layer address.
    pub peer_id: PeerId,
    /// Key exchange state.
    pub crypto: PeerCrypto,
    /// Transport-level liveness.
    pub connected: bool,
    /// Out-of-band verified trust; persisted by the engine.
    pub verified: bool,
    /// Last observed signal strength in dBm.
    pub rssi: Option<i16>,
    /// Last discovery or state-change time, milliseconds since epoch.
    pub last_seen: u64,
}

/// Secret-free view of a peer record for the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    pub peer_id: PeerId,
    pub connected: bool,
    pub verified: bool,
    /// True once key exchange has completed.
    pub has_key: bool,
    /// Wire sender id, once a key is bound.
    pub sender_id: Option<String>,
    pub rssi: Option<i16>,
    pub last_seen: u64,
}

/// Directory of known peers, keyed by transport address.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<PeerId, PeerRecord>,
}

impl PeerTable {
    pub fn new() -> Self {
        PeerTable {
            peers: HashMap::new(),
        }
    }

    /// Creates or refreshes a peer from a discovery event.
    ///
    /// Existing key, trust, and connection state are preserved.
    pub fn upsert_discovered(&mut self, peer_id: &str, rssi: i16, now_ms: u64) {
        let record = self
            .peers
            .entry(peer_id.to_string())
            .or_insert_with(|| PeerRecord {
                peer_id: peer_id.to_string(),
                crypto: PeerCrypto::None,
                connected: false,
                verified: false,
                rssi: None,
                last_seen: 0,
            });
        record.rssi = Some(rssi);
        record.last_seen = now_ms;
    }

    /// Binds a peer's public key and its derived shared secret.
    ///
    /// Re-binding the same key is a no-op. A conflicting key replaces the
    /// binding and clears `verified`: trust belongs to a key, not to a
    /// transport address.
    pub fn bind_public_key(
        &mut self,
        peer_id: &str,
        public_key: [u8; 32],
        shared_secret: SymmetricKey,
    ) -> KeyBinding {
        let record = self
            .peers
            .entry(peer_id.to_string())
            .or_insert_with(|| PeerRecord {
                peer_id: peer_id.to_string(),
                crypto: PeerCrypto::None,
                connected: false,
                verified: false,
                rssi: None,
                last_seen: 0,
            });

        let outcome = match record.crypto.public_key() {
            Some(existing) if *existing == public_key => return KeyBinding::Unchanged,
            Some(_) => KeyBinding::Replaced,
            None => KeyBinding::Bound,
        };

        record.crypto = PeerCrypto::Keyed {
            sender_id: sender_id(&public_key),
            public_key,
            shared_secret,
        };
        if outcome == KeyBinding::Replaced {
            record.verified = false;
        }
        outcome
    }

    /// Updates transport-level liveness.
    pub fn set_connected(&mut self, peer_id: &str, connected: bool, now_ms: u64) {
        if let Some(record) = self.peers.get_mut(peer_id) {
            record.connected = connected;
            record.last_seen = now_ms;
        }
    }

    /// Sets the trust flag. Refused while no key is bound: there is nothing
    /// a scanned fingerprint could have matched against.
    pub fn set_verified(&mut self, peer_id: &str, verified: bool) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(record) if record.crypto.public_key().is_some() || !verified => {
                record.verified = verified;
                true
            }
            _ => false,
        }
    }

    /// Removes a peer entirely (explicit user command; disconnects never
    /// remove records).
    pub fn remove(&mut self, peer_id: &str) -> Option<PeerRecord> {
        self.peers.remove(peer_id)
    }

    /// Looks up a peer record.
    pub fn get(&self, peer_id: &str) -> Option<&PeerRecord> {
        self.peers.get(peer_id)
    }

    /// Finds the peer whose bound public key hashes to the given wire
    /// sender id.
    pub fn lookup_by_sender_id(&self, sender: &str) -> Option<PeerId> {
        self.peers
            .values()
            .find(|r| r.crypto.sender_id() == Some(sender))
            .map(|r| r.peer_id.clone())
    }

    /// Number of known peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True if no peers are known.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Secret-free snapshot of every record, sorted by address for stable
    /// presentation.
    pub fn snapshot(&self) -> Vec<PeerSnapshot> {
        let mut peers: Vec<PeerSnapshot> = self
            .peers
            .values()
            .map(|r| PeerSnapshot {
                peer_id: r.peer_id.clone(),
                connected: r.connected,
                verified: r.verified,
                has_key: r.crypto.public_key().is_some(),
                sender_id: r.crypto.sender_id().map(str::to_string),
                rssi: r.rssi,
                last_seen: r.last_seen,
            })
            .collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        peers
    }
}
