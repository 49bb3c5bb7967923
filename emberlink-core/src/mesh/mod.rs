// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mesh Messaging Layer
//!
//! Store-and-forward flood relay over whatever transport is plugged in.
//!
//! # Architecture
//!
//! The mesh layer consists of:
//! - **Peer table**: directory of known peers with key, trust, and
//!   liveness state
//! - **Duplicate cache**: time-expiring set of seen message ids that keeps
//!   the flood from looping
//! - **Retry queue**: exponential-backoff resend of messages no neighbor
//!   accepted
//! - **Events**: observer callbacks for received messages, status changes,
//!   and relay traces
//! - **Engine**: the orchestrator tying send, receive, relay, and timers
//!   together
//!
//! # Example
//!
//! ```ignore
//! use emberlink_core::mesh::{EngineConfig, MeshEngine};
//!
//! let mut engine = MeshEngine::new(transport, storage, EngineConfig::default())?;
//! engine.handle_discovered(&peer, -48);
//! engine.connect(&peer)?;
//! engine.bind_peer_key(&peer, peer_public_key)?;
//! let message = engine.send_message(&peer, "meet at the north shelter")?;
//! ```

pub mod dedup;
pub mod engine;
pub mod events;
pub mod peer;
pub mod retry;

pub use dedup::{DuplicateCache, DEDUP_CAPACITY, DEDUP_WINDOW_MS};
pub use engine::{EngineConfig, EngineError, MeshEngine, SendError, SCAN_INTERVAL_MS};
pub use events::{CallbackHandler, EventDispatcher, EventHandler, MeshEvent, RelayOutcome};
pub use peer::{KeyBinding, PeerCrypto, PeerRecord, PeerSnapshot, PeerTable};
pub use retry::{RetryEntry, RetryQueue, RetryVerdict, MAX_RETRY_ATTEMPTS, RETRY_BASE_MS};
