// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the relay state machine: store-and-forward through middle
//! nodes, duplicate suppression, and TTL exhaustion.

mod common;

use common::{exchange_keys, link, node, pump, received_texts, relay_traces};
use emberlink_core::protocol;

// === Scenario: relay through a middle node ===

#[test]
fn test_relay_through_middle_node() {
    let mut a = node("node-a");
    let mut b = node("node-b");
    let mut c = node("node-c");

    // A <-> B <-> C connected; A and C have each other's keys, B has none.
    link(&mut a, &mut b);
    link(&mut b, &mut c);
    exchange_keys(&mut a, &mut c);

    a.engine.send_message("node-c", "relay please").unwrap();

    // Capture the original envelope before the harness moves it.
    let sent = a.engine.transport_mut().take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "node-b");
    let original = protocol::deserialize(&sent[0].1).unwrap();

    b.engine.ingest_bytes("node-a", &sent[0].1);

    // B could not decrypt, but forwards anyway: one hop, ttl decremented,
    // never back to the inbound peer.
    let relayed = b.engine.transport_mut().take_sent();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].0, "node-c");
    let hop = protocol::deserialize(&relayed[0].1).unwrap();
    assert_eq!(hop.ttl, original.ttl - 1);
    assert_eq!(hop.ttl, 9);

    // The hop equals the input except for the ttl.
    let mut expected = original.clone();
    expected.ttl = 9;
    assert_eq!(hop, expected);

    // B saw nothing it could read.
    assert!(received_texts(&b).is_empty());
    assert_eq!(relay_traces(&b), vec![(9, vec!["node-c".to_string()])]);

    // C decrypts and delivers.
    c.engine.ingest_bytes("node-b", &relayed[0].1);
    assert_eq!(received_texts(&c), vec!["relay please".to_string()]);
}

// === Scenario: duplicate suppression in a triangle ===

#[test]
fn test_triangle_delivers_exactly_once() {
    let mut a = node("node-a");
    let mut b = node("node-b");
    let mut c = node("node-c");

    link(&mut a, &mut b);
    link(&mut b, &mut c);
    link(&mut a, &mut c);
    exchange_keys(&mut a, &mut c);
    exchange_keys(&mut a, &mut b);

    a.engine.send_message("node-c", "broadcast").unwrap();

    let mut nodes = [a, b, c];
    pump(&mut nodes);

    // C got the direct copy and B's relayed copy; the second was discarded
    // silently. The receive event fired exactly once.
    assert_eq!(received_texts(&nodes[2]), vec!["broadcast".to_string()]);

    // B held A's key but the message was not for B: no local delivery.
    assert!(received_texts(&nodes[1]).is_empty());

    // Each node relayed the id at most once.
    for node in &nodes {
        assert!(relay_traces(node).len() <= 1);
    }
}

#[test]
fn test_second_copy_is_ignored_even_from_another_peer() {
    let mut a = node("node-a");
    let mut b = node("node-b");
    let mut c = node("node-c");
    link(&mut a, &mut c);
    link(&mut b, &mut c);
    exchange_keys(&mut a, &mut c);

    a.engine.send_message("node-c", "once only").unwrap();
    let sent = a.engine.transport_mut().take_sent();
    let frame = &sent[0].1;

    c.engine.ingest_bytes("node-a", frame);
    // The same bytes arrive again via B.
    c.engine.ingest_bytes("node-b", frame);

    assert_eq!(received_texts(&c), vec!["once only".to_string()]);
    assert_eq!(relay_traces(&c).len(), 1);
}

// === Scenario: TTL exhaustion along a chain ===

#[test]
fn test_ttl_exhaustion_in_a_twelve_node_chain() {
    let names: Vec<String> = (b'a'..=b'l').map(|c| format!("node-{}", c as char)).collect();
    let mut nodes: Vec<common::Node> = names.iter().map(|n| node(n)).collect();

    // Linear chain: each pair of neighbors connected, nothing beyond.
    for i in 0..nodes.len() - 1 {
        let (left, right) = nodes.split_at_mut(i + 1);
        link(&mut left[i], &mut right[0]);
    }

    // The endpoints know each other's keys (exchanged earlier out-of-range).
    {
        let (first, rest) = nodes.split_at_mut(1);
        let last = rest.last_mut().unwrap();
        exchange_keys(&mut first[0], last);
    }

    nodes[0]
        .engine
        .send_message("node-l", "end of the line")
        .unwrap();
    pump(&mut nodes);

    // Delivered at the far end despite arriving with ttl = 0.
    assert_eq!(received_texts(&nodes[11]), vec!["end of the line".to_string()]);

    // Hop budget: A emits ttl 10; B..K relay ttl 9..0; L does not relay.
    for (i, expected_ttl) in (1..=10).zip((0..=9).rev()) {
        assert_eq!(
            relay_traces(&nodes[i]),
            vec![(expected_ttl, vec![names[i + 1].clone()])],
            "node {} should relay exactly once with ttl {}",
            names[i],
            expected_ttl
        );
    }
    assert!(relay_traces(&nodes[11]).is_empty());

    // Middle nodes never delivered the message locally.
    for middle in &nodes[1..11] {
        assert!(received_texts(middle).is_empty());
    }
}

#[test]
fn test_zero_ttl_envelope_is_delivered_but_not_relayed() {
    let mut a = node("node-a");
    let mut b = node("node-b");
    let mut c = node("node-c");
    link(&mut a, &mut b);
    link(&mut b, &mut c);
    exchange_keys(&mut a, &mut b);

    a.engine.send_message("node-b", "last hop").unwrap();
    let sent = a.engine.transport_mut().take_sent();

    // Rewrite the envelope to arrive with an exhausted hop budget.
    let mut envelope = protocol::deserialize(&sent[0].1).unwrap();
    envelope.ttl = 0;
    let bytes = protocol::serialize(&envelope).unwrap();

    b.engine.ingest_bytes("node-a", &bytes);

    assert_eq!(received_texts(&b), vec!["last hop".to_string()]);
    assert!(relay_traces(&b).is_empty());
    assert!(b.engine.transport_mut().take_sent().is_empty());
}

#[test]
fn test_malformed_bytes_are_dropped_without_delivery_or_relay() {
    let mut a = node("node-a");
    let mut b = node("node-b");
    link(&mut a, &mut b);

    b.engine.ingest_bytes("node-a", b"not an envelope");
    b.engine.ingest_bytes("node-a", &[]);

    assert!(received_texts(&b).is_empty());
    assert!(relay_traces(&b).is_empty());
    assert!(b.engine.transport_mut().take_sent().is_empty());

    // The drops are visible to observability.
    let drops = b
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, emberlink_core::mesh::MeshEvent::EnvelopeDropped { .. }))
        .count();
    assert_eq!(drops, 2);
}
