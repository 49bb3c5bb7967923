// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Model
//!
//! The application-facing record of one chat message. Envelopes come and go;
//! this is what persists in history.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique message identifier (UUID v4, hyphenated).
pub type MessageId = String;

/// Opaque transport-layer peer address.
pub type PeerId = String;

/// Maximum message length in Unicode scalar values.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Which side of the conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Sent,
    Received,
}

/// Delivery state of a sent message.
///
/// Received messages are always `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Queued locally; no neighbor has accepted the bytes yet.
    Pending,
    /// At least one transmission succeeded.
    Delivered,
    /// All transmission attempts exhausted.
    Failed,
}

impl MessageStatus {
    /// Storage column form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Failed => "failed",
        }
    }

    /// Parses the storage column form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MessageStatus::Pending),
            "delivered" => Some(MessageStatus::Delivered),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

impl MessageDirection {
    /// Storage column form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Sent => "sent",
            MessageDirection::Received => "received",
        }
    }

    /// Parses the storage column form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(MessageDirection::Sent),
            "received" => Some(MessageDirection::Received),
            _ => None,
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// The conversation peer: recipient for outbound, sender for inbound.
    pub peer_id: PeerId,
    /// Plaintext body.
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Sent or received.
    pub direction: MessageDirection,
    /// Delivery state (meaningful for sent messages).
    pub status: MessageStatus,
}

impl Message {
    /// Creates an outbound message in the `Pending` state with a fresh id.
    pub fn outbound(peer_id: &str, text: &str, timestamp: u64) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            peer_id: peer_id.to_string(),
            text: text.to_string(),
            timestamp,
            direction: MessageDirection::Sent,
            status: MessageStatus::Pending,
        }
    }

    /// Creates an inbound message carrying the sender's envelope id and
    /// timestamp.
    pub fn inbound(id: &str, peer_id: &str, text: &str, timestamp: u64) -> Self {
        Message {
            id: id.to_string(),
            peer_id: peer_id.to_string(),
            text: text.to_string(),
            timestamp,
            direction: MessageDirection::Received,
            status: MessageStatus::Delivered,
        }
    }
}
