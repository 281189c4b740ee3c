// Copyright (c) 2026 Chainnode
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

//! Two real `SessionMultiplexer` instances, one listening and one
//! dialing over loopback TCP, complete the ECDH handshake and `Hello`
//! negotiation and both surface a `MuxEvent::Connected` (spec.md §4.8)
//! with the other side's advertised capabilities.

use std::collections::BTreeSet;
use std::time::Duration;

use chainnode::network::session::{MuxEvent, SessionMultiplexer};
use ethereum_types::H256;

#[tokio::test]
async fn inbound_and_outbound_sessions_both_see_connected() {
    let server_caps: BTreeSet<String> = ["eth/68".to_string()].into_iter().collect();
    let client_caps: BTreeSet<String> = ["eth/67".to_string(), "eth/68".to_string()]
        .into_iter()
        .collect();

    let (mut server_mux, mut server_events) = SessionMultiplexer::new(
        "chainnode/server".to_string(),
        server_caps.clone(),
        H256::repeat_byte(0xAA),
        Vec::new(),
        25,
    );
    let port = server_mux.listen(0, "127.0.0.1").await.unwrap();

    let (client_mux, mut client_events) = SessionMultiplexer::new(
        "chainnode/client".to_string(),
        client_caps.clone(),
        H256::repeat_byte(0xBB),
        Vec::new(),
        25,
    );

    let connect_task = tokio::spawn(async move {
        client_mux.connect("127.0.0.1", port).await.unwrap();
    });

    let server_side = tokio::time::timeout(Duration::from_secs(5), server_events.recv())
        .await
        .expect("server saw a MuxEvent before the timeout")
        .expect("server events channel open");
    let client_side = tokio::time::timeout(Duration::from_secs(5), client_events.recv())
        .await
        .expect("client saw a MuxEvent before the timeout")
        .expect("client events channel open");

    match server_side {
        MuxEvent::Connected(record) => {
            assert!(record.inbound);
            assert_eq!(record.protocols, client_caps);
        }
        other => panic!("expected Connected on the server side, got {other:?}"),
    }

    match client_side {
        MuxEvent::Connected(record) => {
            assert!(!record.inbound);
            assert_eq!(record.protocols, server_caps);
        }
        other => panic!("expected Connected on the client side, got {other:?}"),
    }

    connect_task.abort();
    server_mux.destroy().await;
}

/// spec.md §4.8: `SessionMultiplexer` is constructed with `maxPeers`, and an
/// inbound session past the cap is rejected before `MuxEvent::Connected`
/// is ever emitted.
#[tokio::test]
async fn inbound_session_past_max_peers_is_rejected() {
    let (mut server_mux, mut server_events) = SessionMultiplexer::new(
        "chainnode/server".to_string(),
        BTreeSet::new(),
        H256::repeat_byte(0xCC),
        Vec::new(),
        0,
    );
    let port = server_mux.listen(0, "127.0.0.1").await.unwrap();

    let (client_mux, _client_events) = SessionMultiplexer::new(
        "chainnode/client".to_string(),
        BTreeSet::new(),
        H256::repeat_byte(0xDD),
        Vec::new(),
        25,
    );
    let connect_task = tokio::spawn(async move {
        let _ = client_mux.connect("127.0.0.1", port).await;
    });

    let server_side = tokio::time::timeout(Duration::from_secs(5), server_events.recv())
        .await
        .expect("server saw a MuxEvent before the timeout")
        .expect("server events channel open");

    match server_side {
        MuxEvent::Error(message) => assert!(message.contains("max peers")),
        other => panic!("expected a max-peers Error, got {other:?}"),
    }

    connect_task.abort();
    server_mux.destroy().await;
}
