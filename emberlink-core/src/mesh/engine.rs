// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mesh Engine
//!
//! The orchestration layer: every user-facing messaging decision lives
//! here. The engine composes the codec, the crypto channel, the peer table,
//! the duplicate cache, and the retry queue into three flows:
//!
//! - **send**: validate, encrypt, persist pending, flood to every connected
//!   neighbor.
//! - **receive**: parse, dedup, decrypt-if-ours, persist, then relay with a
//!   decremented hop budget.
//! - **tick**: the single periodic driver for retries, cache sweeps, and
//!   scan requests.
//!
//! The engine is a synchronous state machine behind `&mut self`. Transport
//! callbacks, user operations, and the timer all funnel through whatever
//! serialization the caller provides (a coarse mutex or a single-task
//! inbox); the engine itself holds no lock across a transport call because
//! it holds no locks at all.

use std::sync::Arc;

use thiserror::Error;

use crate::crypto::{self, verify_fingerprint, EncryptionError};
use crate::identity::{IdentityError, MeshIdentity};
use crate::message::{Message, MessageStatus, PeerId, MAX_MESSAGE_CHARS};
use crate::protocol::{self, CodecError, MessageEnvelope, INITIAL_TTL, PROTOCOL_VERSION};
use crate::storage::{Storage, StorageError};
use crate::transport::{MeshTransport, TransportResult};

use super::dedup::DuplicateCache;
use super::events::{EventDispatcher, EventHandler, MeshEvent, RelayOutcome};
use super::peer::{KeyBinding, PeerCrypto, PeerSnapshot, PeerTable};
use super::retry::{RetryQueue, RetryVerdict};

/// Default cadence for periodic scan requests (5 s).
pub const SCAN_INTERVAL_MS: u64 = 5_000;

/// Errors surfaced by [`MeshEngine::send_message`].
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Message text is empty")]
    EmptyMessage,
    #[error("Message exceeds the 500 character limit")]
    TooLong,
    #[error("Unknown peer {0}")]
    UnknownPeer(PeerId),
    #[error("Key exchange with {0} has not completed")]
    NoSharedSecret(PeerId),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),
}

/// Errors surfaced by engine construction and peer key binding.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Tunable engine parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hop budget for freshly sent messages.
    pub initial_ttl: u8,
    /// Maximum message length in Unicode scalar values.
    pub max_message_chars: usize,
    /// Cadence of periodic scan requests.
    pub scan_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_ttl: INITIAL_TTL,
            max_message_chars: MAX_MESSAGE_CHARS,
            scan_interval_ms: SCAN_INTERVAL_MS,
        }
    }
}

/// The mesh messaging engine.
///
/// # Example
///
/// ```ignore
/// use emberlink_core::crypto::SymmetricKey;
/// use emberlink_core::mesh::{EngineConfig, MeshEngine};
/// use emberlink_core::storage::Storage;
/// use emberlink_core::transport::MockTransport;
///
/// let storage = Storage::in_memory(SymmetricKey::generate())?;
/// let mut engine = MeshEngine::new(MockTransport::new(), storage, EngineConfig::default())?;
///
/// // Wire transport callbacks to the engine hooks, then:
/// let message = engine.send_message(&peer, "hello out there")?;
/// ```
pub struct MeshEngine<T: MeshTransport> {
    transport: T,
    storage: Storage,
    identity: MeshIdentity,
    peers: PeerTable,
    dedup: DuplicateCache,
    retries: RetryQueue,
    events: EventDispatcher,
    config: EngineConfig,
    last_scan_at: Option<u64>,
}

impl<T: MeshTransport> MeshEngine<T> {
    /// Creates an engine: loads (or generates) the identity and restores
    /// the persisted duplicate-cache snapshot.
    pub fn new(transport: T, storage: Storage, config: EngineConfig) -> Result<Self, EngineError> {
        let identity = MeshIdentity::load_or_create(&storage)?;

        let mut dedup = DuplicateCache::new();
        dedup.restore(storage.load_seen_messages()?, now_ms());

        Ok(MeshEngine {
            transport,
            storage,
            identity,
            peers: PeerTable::new(),
            dedup,
            retries: RetryQueue::new(),
            events: EventDispatcher::new(),
            config,
            last_scan_at: None,
        })
    }

    // === User Operations ===

    /// Composes, encrypts, and floods a message to a peer.
    ///
    /// The returned record is already persisted; its status is `Delivered`
    /// if at least one neighbor accepted the bytes, otherwise `Pending`
    /// with a queued retry.
    pub fn send_message(&mut self, recipient: &str, text: &str) -> Result<Message, SendError> {
        if text.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_chars {
            return Err(SendError::TooLong);
        }

        let record = self
            .peers
            .get(recipient)
            .ok_or_else(|| SendError::UnknownPeer(recipient.to_string()))?;
        let (shared_secret, recipient_id) = match &record.crypto {
            PeerCrypto::Keyed {
                shared_secret,
                sender_id,
                ..
            } => (shared_secret.clone(), sender_id.clone()),
            PeerCrypto::None => return Err(SendError::NoSharedSecret(recipient.to_string())),
        };

        let now = now_ms();
        let mut message = Message::outbound(recipient, text, now);

        let sealed = crypto::encrypt(&shared_secret, text.as_bytes()).map_err(|e| {
            debug_assert!(false, "encryption failed with a valid shared secret: {e}");
            e
        })?;

        let envelope = MessageEnvelope {
            version: PROTOCOL_VERSION,
            message_id: message.id.clone(),
            sender_id: self.identity.sender_id().to_string(),
            recipient_id,
            timestamp: now,
            ttl: self.config.initial_ttl,
            nonce: sealed.nonce.to_vec(),
            tag: sealed.tag.to_vec(),
            ciphertext: sealed.ciphertext,
        };
        let bytes = protocol::serialize(&envelope)?;

        // Persist before any transmission so history survives a crash
        // mid-flood.
        self.storage.store_message(&message)?;

        // Our own flood will echo back through neighbors acting as relays;
        // marking the id now makes the echo a duplicate.
        self.dedup.mark_processed(&message.id, now);

        if self.flood(&bytes, None) {
            message.status = MessageStatus::Delivered;
            self.storage
                .update_message_status(&message.id, MessageStatus::Delivered)?;
            self.events.dispatch(MeshEvent::MessageStatus {
                message_id: message.id.clone(),
                status: MessageStatus::Delivered,
            });
        } else {
            self.retries.enqueue(&message.id, bytes, now);
        }

        Ok(message)
    }

    /// Checks a scanned fingerprint against a peer's bound public key and
    /// persists the trust decision on a match.
    pub fn verify_peer(&mut self, peer_id: &str, scanned: &str) -> bool {
        let public_key = match self.peers.get(peer_id).and_then(|r| r.crypto.public_key()) {
            Some(pk) => *pk,
            None => return false,
        };

        if !verify_fingerprint(scanned, &public_key) {
            return false;
        }

        self.peers.set_verified(peer_id, true);
        if let Err(e) = self.storage.store_trust(peer_id, true) {
            self.events.dispatch(MeshEvent::Error {
                message: format!("failed to persist trust for {peer_id}: {e}"),
            });
        }
        true
    }

    /// Removes a peer and its persisted trust (explicit user command).
    pub fn remove_peer(&mut self, peer_id: &str) -> Result<(), StorageError> {
        self.peers.remove(peer_id);
        self.storage.clear_trust(peer_id)
    }

    /// Initiates a connection to a discovered peer.
    pub fn connect(&mut self, peer_id: &str) -> TransportResult<()> {
        self.transport.connect(peer_id)
    }

    /// Disconnects from a peer. The record stays in the table.
    pub fn disconnect(&mut self, peer_id: &str) -> TransportResult<()> {
        self.transport.disconnect(peer_id)
    }

    /// Starts discovery immediately, outside the periodic cadence.
    pub fn start_scan(&mut self) -> TransportResult<()> {
        self.transport.start_scan()
    }

    /// Stops discovery. Best-effort; the next tick may start it again.
    pub fn stop_scan(&mut self) -> TransportResult<()> {
        self.transport.stop_scan()
    }

    // === Transport Hooks ===

    /// Transport callback: a nearby node was discovered.
    pub fn handle_discovered(&mut self, peer_id: &str, rssi: i16) {
        self.peers.upsert_discovered(peer_id, rssi, now_ms());
    }

    /// Transport callback: a peer's connection state changed.
    pub fn handle_state_change(&mut self, peer_id: &str, connected: bool) {
        self.peers.set_connected(peer_id, connected, now_ms());
    }

    /// A peer's identity public key arrived in-band.
    ///
    /// Derives and stores the shared secret. Binding the same key again is
    /// a no-op; a conflicting key replaces the binding and revokes trust.
    /// Persisted trust is applied only on the first binding for a peer.
    pub fn bind_peer_key(&mut self, peer_id: &str, public_key: [u8; 32]) -> Result<(), EngineError> {
        let shared_secret = self.identity.agree(&public_key);
        match self.peers.bind_public_key(peer_id, public_key, shared_secret) {
            KeyBinding::Bound => {
                if self.storage.load_trust(peer_id)? {
                    self.peers.set_verified(peer_id, true);
                }
            }
            KeyBinding::Replaced => {
                self.storage.store_trust(peer_id, false)?;
            }
            KeyBinding::Unchanged => {}
        }
        Ok(())
    }

    /// Transport callback: raw envelope bytes arrived from a peer.
    ///
    /// Malformed input is dropped (surfaced only as an observability
    /// event); duplicates are dropped silently; everything else is
    /// delivered locally when decryptable and relayed while the hop budget
    /// lasts.
    pub fn ingest_bytes(&mut self, from: &str, bytes: &[u8]) {
        let now = now_ms();

        // Structural gate: the codec enforces the envelope invariants, so
        // anything that parses here is also safe to relay.
        let envelope = match protocol::deserialize(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.events.dispatch(MeshEvent::EnvelopeDropped {
                    peer_id: from.to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        if self.dedup.is_duplicate(&envelope.message_id) {
            return;
        }
        self.dedup.mark_processed(&envelope.message_id, now);

        self.deliver_local(&envelope, from);

        if envelope.ttl > 0 {
            self.relay(&envelope, from, now);
        }
    }

    /// Attempts local delivery of an inbound envelope.
    ///
    /// Decryption failure is not an error: the envelope is simply addressed
    /// to someone else (or the sender is unknown), and the caller will
    /// still relay it.
    fn deliver_local(&mut self, envelope: &MessageEnvelope, from: &str) {
        // Prefer the peer whose bound key matches the envelope's sender id;
        // fall back to the transport address the bytes came from.
        let peer_id = self
            .peers
            .lookup_by_sender_id(&envelope.sender_id)
            .unwrap_or_else(|| from.to_string());

        let shared_secret = match self.peers.get(&peer_id).and_then(|r| r.crypto.shared_secret())
        {
            Some(secret) => secret.clone(),
            None => return,
        };

        let plaintext = match crypto::decrypt(
            &shared_secret,
            &envelope.nonce,
            &envelope.tag,
            &envelope.ciphertext,
        ) {
            Ok(plaintext) => plaintext,
            Err(_) => return,
        };

        let text = match String::from_utf8(plaintext) {
            Ok(text) => text,
            Err(_) => return,
        };

        let message = Message::inbound(&envelope.message_id, &peer_id, &text, envelope.timestamp);

        // History durability: persist before announcing. A storage failure
        // downgrades to an observability event; the in-memory flow goes on.
        if let Err(e) = self.storage.store_message(&message) {
            self.events.dispatch(MeshEvent::Error {
                message: format!("failed to persist received message: {e}"),
            });
        }
        self.events.dispatch(MeshEvent::MessageReceived(message));
    }

    /// Forwards an envelope to every connected neighbor except the inbound
    /// one, with the hop budget decremented. No storage on this path.
    fn relay(&mut self, envelope: &MessageEnvelope, inbound: &str, now_ms: u64) {
        let hop = envelope.next_hop();
        let bytes = match protocol::serialize(&hop) {
            Ok(bytes) => bytes,
            Err(_) => return,
        };

        let mut outcomes = Vec::new();
        for peer_id in self.transport.connected_peers() {
            if peer_id == inbound {
                continue;
            }
            let ok = self.transport.send(&peer_id, &bytes).is_ok();
            outcomes.push(RelayOutcome { peer_id, ok });
        }

        self.events.dispatch(MeshEvent::Relayed {
            id_prefix: hop.id_prefix(),
            ttl: hop.ttl,
            timestamp: now_ms,
            outcomes,
        });
    }

    // === Timers ===

    /// Periodic driver, expected roughly every second.
    ///
    /// Sweeps the duplicate cache, retries due sends, and keeps discovery
    /// scans running on their cadence.
    pub fn tick(&mut self, now_ms: u64) {
        self.dedup.prune(now_ms);

        let scan_due = match self.last_scan_at {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.scan_interval_ms,
        };
        if scan_due {
            // Best effort; a failed scan request just waits for the next tick.
            let _ = self.transport.start_scan();
            self.last_scan_at = Some(now_ms);
        }

        for message_id in self.retries.due(now_ms) {
            let bytes = match self.retries.envelope_bytes(&message_id) {
                Some(bytes) => bytes.to_vec(),
                None => continue,
            };

            if self.flood(&bytes, None) {
                self.retries.remove(&message_id);
                self.finish_retry(&message_id, MessageStatus::Delivered);
            } else if self.retries.record_failure(&message_id, now_ms) == RetryVerdict::Exhausted {
                self.finish_retry(&message_id, MessageStatus::Failed);
            }
        }
    }

    /// Persists the duplicate-cache snapshot. Call once on shutdown.
    pub fn shutdown(&mut self) -> Result<(), StorageError> {
        self.storage.save_seen_messages(&self.dedup.snapshot())
    }

    // === Views ===

    /// Secret-free snapshot of every known peer.
    pub fn peers(&self) -> Vec<PeerSnapshot> {
        self.peers.snapshot()
    }

    /// Conversation history with one peer, oldest first.
    pub fn messages(&self, peer_id: &str) -> Result<Vec<Message>, StorageError> {
        self.storage.load_messages(peer_id)
    }

    /// The local node's identity.
    pub fn identity(&self) -> &MeshIdentity {
        &self.identity
    }

    /// Registers an event handler.
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Direct access to the transport (tests and platform glue).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // === Internals ===

    /// Writes bytes to every connected peer except `exclude`. Each send is
    /// independent; one failure never aborts the flood. Returns true if at
    /// least one neighbor accepted the bytes.
    fn flood(&mut self, bytes: &[u8], exclude: Option<&str>) -> bool {
        let mut any_ok = false;
        for peer_id in self.transport.connected_peers() {
            if Some(peer_id.as_str()) == exclude {
                continue;
            }
            if self.transport.send(&peer_id, bytes).is_ok() {
                any_ok = true;
            }
        }
        any_ok
    }

    /// Terminal status update for a retried message.
    fn finish_retry(&mut self, message_id: &str, status: MessageStatus) {
        if let Err(e) = self.storage.update_message_status(message_id, status) {
            self.events.dispatch(MeshEvent::Error {
                message: format!("failed to persist status for {message_id}: {e}"),
            });
        }
        self.events.dispatch(MeshEvent::MessageStatus {
            message_id: message_id.to_string(),
            status,
        });
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_millis() as u64
}
