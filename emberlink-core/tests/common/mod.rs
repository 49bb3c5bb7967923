// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared test harness: in-memory mesh nodes wired together by hand.
//!
//! Each node is a real engine over a `MockTransport`; the harness plays the
//! radio, draining every node's outbound frames and feeding them to their
//! targets until the mesh goes quiet.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use emberlink_core::crypto::SymmetricKey;
use emberlink_core::mesh::{CallbackHandler, EngineConfig, MeshEngine, MeshEvent};
use emberlink_core::message::MessageStatus;
use emberlink_core::storage::Storage;
use emberlink_core::transport::MockTransport;

/// One simulated mesh node.
pub struct Node {
    pub addr: String,
    pub engine: MeshEngine<MockTransport>,
    pub events: Arc<Mutex<Vec<MeshEvent>>>,
}

/// Creates a node with a random identity.
pub fn node(addr: &str) -> Node {
    build_node(addr, None)
}

/// Creates a node with a fixed identity secret.
pub fn node_with_secret(addr: &str, secret: [u8; 32]) -> Node {
    build_node(addr, Some(secret))
}

fn build_node(addr: &str, secret: Option<[u8; 32]>) -> Node {
    let storage = Storage::in_memory(SymmetricKey::generate()).unwrap();

    if let Some(secret) = secret {
        let keypair = emberlink_core::crypto::IdentityKeyPair::from_bytes(secret);
        storage
            .store_identity(&keypair.public_bytes(), &keypair.secret_bytes())
            .unwrap();
    }

    let mut engine =
        MeshEngine::new(MockTransport::new(), storage, EngineConfig::default()).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.add_event_handler(Arc::new(CallbackHandler::new(move |event| {
        sink.lock().unwrap().push(event);
    })));

    Node {
        addr: addr.to_string(),
        engine,
        events,
    }
}

/// Mutually discovers and connects two nodes.
pub fn link(a: &mut Node, b: &mut Node) {
    a.engine.handle_discovered(&b.addr, -48);
    b.engine.handle_discovered(&a.addr, -48);

    a.engine.connect(&b.addr).unwrap();
    a.engine.handle_state_change(&b.addr, true);
    b.engine.connect(&a.addr).unwrap();
    b.engine.handle_state_change(&a.addr, true);
}

/// Exchanges identity public keys between two nodes (in-band key exchange).
pub fn exchange_keys(a: &mut Node, b: &mut Node) {
    let pk_a = a.engine.identity().public_key();
    let pk_b = b.engine.identity().public_key();
    a.engine.bind_peer_key(&b.addr, pk_b).unwrap();
    b.engine.bind_peer_key(&a.addr, pk_a).unwrap();
}

/// Plays the radio: moves outbound frames between nodes until no node has
/// anything left to transmit. Frames addressed to nodes outside the slice
/// are dropped, like radio into the void.
pub fn pump(nodes: &mut [Node]) {
    loop {
        let mut frames: Vec<(String, String, Vec<u8>)> = Vec::new();
        for node in nodes.iter_mut() {
            let from = node.addr.clone();
            for (to, bytes) in node.engine.transport_mut().take_sent() {
                frames.push((from.clone(), to, bytes));
            }
        }
        if frames.is_empty() {
            break;
        }
        for (from, to, bytes) in frames {
            if let Some(target) = nodes.iter_mut().find(|n| n.addr == to) {
                target.engine.ingest_bytes(&from, &bytes);
            }
        }
    }
}

/// Texts of all messages a node's application saw, in arrival order.
pub fn received_texts(node: &Node) -> Vec<String> {
    node.events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            MeshEvent::MessageReceived(message) => Some(message.text.clone()),
            _ => None,
        })
        .collect()
}

/// Status transitions a node's application saw, in order.
pub fn status_events(node: &Node) -> Vec<(String, MessageStatus)> {
    node.events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            MeshEvent::MessageStatus { message_id, status } => {
                Some((message_id.clone(), *status))
            }
            _ => None,
        })
        .collect()
}

/// Relay traces a node emitted: (ttl after decrement, targets that succeeded).
pub fn relay_traces(node: &Node) -> Vec<(u8, Vec<String>)> {
    node.events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            MeshEvent::Relayed { ttl, outcomes, .. } => Some((
                *ttl,
                outcomes
                    .iter()
                    .filter(|o| o.ok)
                    .map(|o| o.peer_id.clone())
                    .collect(),
            )),
            _ => None,
        })
        .collect()
}

/// Current wall-clock milliseconds, for driving `tick`.
pub fn wall_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
