// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Callbacks for mesh engine events. Emission is fire-and-forget: handlers
//! run after engine state has settled and must re-enter the engine only
//! through its public API.

use std::sync::Arc;

use crate::message::{Message, MessageId, MessageStatus, PeerId};

/// Per-peer outcome of one relay transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// The neighbor the hop was written to.
    pub peer_id: PeerId,
    /// Whether the transport accepted the bytes.
    pub ok: bool,
}

/// Events emitted by the mesh engine.
#[derive(Debug, Clone)]
pub enum MeshEvent {
    /// A message was decrypted and stored for this node.
    MessageReceived(Message),

    /// A sent message changed delivery state.
    MessageStatus {
        /// The message ID.
        message_id: MessageId,
        /// The new state (`Delivered` or `Failed`).
        status: MessageStatus,
    },

    /// An envelope was forwarded to neighbors (observability trace).
    Relayed {
        /// First characters of the message id.
        id_prefix: String,
        /// Hop budget after the decrement.
        ttl: u8,
        /// When the relay happened, milliseconds since epoch.
        timestamp: u64,
        /// Per-neighbor transmission outcomes.
        outcomes: Vec<RelayOutcome>,
    },

    /// Inbound bytes were dropped before processing (observability trace).
    EnvelopeDropped {
        /// The transport peer the bytes came from.
        peer_id: PeerId,
        /// Why the envelope was dropped.
        reason: String,
    },

    /// A non-fatal error on an asynchronous path (e.g. history persistence
    /// during receive).
    Error {
        /// Error description.
        message: String,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive mesh events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: MeshEvent);
}

/// Simple callback-based event handler.
///
/// Wraps a closure for easy event handling.
pub struct CallbackHandler<F>
where
    F: Fn(MeshEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(MeshEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(MeshEvent) + Send + Sync,
{
    fn on_event(&self, event: MeshEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Removes all handlers.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: MeshEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
