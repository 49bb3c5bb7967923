// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Emberlink Core Library
//!
//! Offline peer-to-peer messaging over BLE for emergency use. Nearby
//! devices discover each other, establish authenticated encrypted channels,
//! and exchange short text messages; intermediate nodes flood-relay
//! envelopes so endpoints out of direct radio range can still communicate.
//!
//! The crate is transport-agnostic: platforms inject a [`transport::MeshTransport`]
//! implementation and a [`storage::Storage`] handle, and wire the radio's
//! discovery/state/bytes callbacks to the engine's hook methods. All engine
//! state sits behind `&mut self`; callers serialize transport callbacks,
//! user operations, and the periodic tick through a coarse mutex or a
//! single-task inbox. Event handlers must not call back into the engine
//! from inside a callback.

pub mod crypto;
pub mod identity;
pub mod mesh;
pub mod message;
pub mod protocol;
pub mod storage;
pub mod transport;

pub use crypto::{IdentityKeyPair, SymmetricKey};
pub use identity::{FingerprintQr, MeshIdentity};
pub use mesh::{
    CallbackHandler, EngineConfig, EventHandler, MeshEngine, MeshEvent, PeerSnapshot, SendError,
};
pub use message::{Message, MessageDirection, MessageId, MessageStatus, PeerId};
pub use protocol::{CodecError, MessageEnvelope};
pub use storage::{Storage, StorageError};
pub use transport::{MeshTransport, MockTransport, TransportError};
