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

//! Shared P2P data model: peer records, capabilities, endpoints, server
//! state, and the event-sink contract the source's loosely-typed emitter
//! is re-architected into (§9 Design Notes).

use std::collections::BTreeSet;
use std::time::Duration;

/// A protocol a session advertises, e.g. `"eth/68"`.
pub type Capability = String;

/// A discovery/session endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub udp_port: u16,
    pub tcp_port: u16,
}

/// Why a peer was removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    Requested,
    TransportError(String),
    Banned,
    Replaced,
}

/// A live, registry-owned peer entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub inbound: bool,
    pub protocols: BTreeSet<Capability>,
}

/// `listening` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListeningInfo {
    pub transport: &'static str,
    pub url: String,
}

/// The discovery/listener port pair reported by `P2PServer::info` (§4.9).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ports {
    pub discovery: u16,
    pub listener: u16,
}

/// `info()`'s return shape (spec.md §4.9): distinct from `ListeningInfo`.
/// `enode`/`id` are `None` until the session multiplexer has bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub enode: Option<String>,
    pub id: Option<String>,
    pub ip: String,
    pub listen_addr: String,
    pub ports: Ports,
}

/// Top-level server configuration/state, per §3.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub started: bool,
    pub local_id: [u8; 32],
    pub bound_port: u16,
    pub advertised_ip: String,
    pub bootnodes: Vec<Endpoint>,
    pub client_filter: Vec<String>,
    pub max_peers: u32,
    pub refresh_interval: Duration,
    pub protocols: BTreeSet<Capability>,
}

/// Re-architected event-emitter idiom (§9 Design Notes): an explicit sink
/// trait instead of a loosely-typed emitter.
pub trait ServerSink: Send + Sync {
    fn connected(&self, record: PeerRecord);
    fn disconnected(&self, record: PeerRecord, reason: Reason);
    fn listening(&self, info: ListeningInfo);
    fn error(&self, error: String, peer: Option<PeerRecord>);
}
