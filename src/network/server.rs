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

//! `P2PServer` (spec.md §4.9): the orchestrator that owns `DiscoveryTable`,
//! `SessionMultiplexer`, and `PeerRegistry`, and drives the single
//! cooperative dispatch context (spec.md §5) that is the only code path
//! allowed to mutate the registry or call into the `ServerSink`.
//!
//! Lifecycle is `Idle -> Starting -> Running -> Stopping -> Idle`
//! (spec.md §8 invariant 9): `start()` and `stop()` are non-reentrant and
//! a `start()` while `Starting`/`Running`/`Stopping` is a no-op error.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::discovery::{DiscoveryEvent, DiscoveryTable};
use super::identity::NodeIdentity;
use super::registry::PeerRegistry;
use super::session::{MuxEvent, SessionMultiplexer};
use super::types::{Endpoint, ListeningInfo, PeerRecord, Ports, Reason, ServerInfo, ServerSink};
use crate::monitoring::Metrics;
use crate::network::errors::is_ignored;

/// Server lifecycle states (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server is already starting or running")]
    AlreadyStarting,
    #[error("server is not running")]
    NotRunning,
    #[error(transparent)]
    Network(#[from] crate::network::errors::NetworkError),
}

/// Parameters needed to bring a `P2PServer` up; mirrors `ServerState`
/// minus the fields only meaningful once running (`started`, `bound_port`).
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub discovery_port: u16,
    pub bootnodes: Vec<Endpoint>,
    pub client_filter: Vec<String>,
    pub max_peers: u32,
    pub refresh_interval: Duration,
    pub protocols: BTreeSet<String>,
    pub client_id: String,
}

/// Orchestrates discovery, session handling, and the peer registry behind
/// a single dispatch loop.
pub struct P2PServer {
    identity: NodeIdentity,
    config: ServerConfig,
    sink: Arc<dyn ServerSink>,
    metrics: Option<Arc<Metrics>>,
    state: Arc<Mutex<LifecycleState>>,
    registry: Arc<Mutex<PeerRegistry>>,
    discovery: Option<DiscoveryTable>,
    mux: Option<SessionMultiplexer>,
    dispatch_task: Option<JoinHandle<()>>,
    bound_tcp_port: u16,
}

impl P2PServer {
    pub fn new(identity: NodeIdentity, config: ServerConfig, sink: Arc<dyn ServerSink>) -> Self {
        Self {
            identity,
            config,
            sink,
            metrics: None,
            state: Arc::new(Mutex::new(LifecycleState::Idle)),
            registry: Arc::new(Mutex::new(PeerRegistry::new())),
            discovery: None,
            mux: None,
            dispatch_task: None,
            bound_tcp_port: 0,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Brings the server from `Idle` to `Running`: binds both transports,
    /// bootstraps discovery, and spawns the dispatch loop. Non-reentrant
    /// (spec.md §8 invariant 9).
    pub async fn start(&mut self) -> Result<(), ServerError> {
        {
            let mut state = self.state.lock().await;
            if *state != LifecycleState::Idle {
                return Err(ServerError::AlreadyStarting);
            }
            *state = LifecycleState::Starting;
        }

        let node_id = self.identity.node_id();
        let (mut discovery, discovery_events) =
            DiscoveryTable::new(*self.identity.secret_key(), self.config.refresh_interval);
        discovery.bind(self.config.discovery_port, &self.config.host).await?;

        let (mut mux, mux_events) = SessionMultiplexer::new(
            self.config.client_id.clone(),
            self.config.protocols.clone(),
            node_id,
            self.config.client_filter.clone(),
            self.config.max_peers,
        );
        let bound_port = mux.listen(self.config.port, &self.config.host).await?;
        self.bound_tcp_port = bound_port;

        discovery.bootstrap(self.config.bootnodes.clone()).await;

        let dispatch_task = spawn_dispatch_loop(
            discovery_events,
            mux_events,
            self.registry.clone(),
            self.sink.clone(),
            self.metrics.clone(),
        );

        self.discovery = Some(discovery);
        self.mux = Some(mux);
        self.dispatch_task = Some(dispatch_task);

        *self.state.lock().await = LifecycleState::Running;
        self.sink.listening(ListeningInfo {
            transport: "tcp",
            url: self.enode_url(),
        });
        Ok(())
    }

    /// Tears the server down, releasing both transports and clearing the
    /// peer registry. Non-reentrant; a `stop()` while `Idle` is a no-op
    /// error (spec.md §8 invariant 9).
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        {
            let mut state = self.state.lock().await;
            if *state != LifecycleState::Running {
                return Err(ServerError::NotRunning);
            }
            *state = LifecycleState::Stopping;
        }

        if let Some(task) = self.dispatch_task.take() {
            task.abort();
        }
        if let Some(mut discovery) = self.discovery.take() {
            discovery.destroy().await;
        }
        if let Some(mut mux) = self.mux.take() {
            mux.destroy().await;
        }
        self.registry.lock().await.clear();

        *self.state.lock().await = LifecycleState::Idle;
        Ok(())
    }

    /// Bans `id` for `max_age_millis`, evicting any live session. Forwards
    /// to `DiscoveryTable` when started; returns `false` without effect
    /// otherwise (spec.md §4.9).
    pub async fn ban(&self, id: &str, max_age_millis: u64) -> bool {
        let Some(discovery) = &self.discovery else {
            return false;
        };
        discovery.ban_peer(id, max_age_millis);
        if let Some(metrics) = &self.metrics {
            metrics.p2p_banned_total.inc();
        }
        let removed = self.registry.lock().await.remove(id);
        if let Some(record) = removed {
            self.sink.disconnected(record, Reason::Banned);
        }
        true
    }

    /// `ban` with spec.md §4.9's default `maxAge` of 60 seconds.
    pub async fn ban_default(&self, id: &str) -> bool {
        self.ban(id, DEFAULT_BAN_MAX_AGE_MILLIS).await
    }

    /// Snapshot of the server's current listening info (spec.md §4.9):
    /// `enode`/`id` are absent until the session multiplexer has bound.
    pub fn info(&self) -> ServerInfo {
        let (enode, id) = if self.mux.is_some() {
            (Some(self.enode_url()), Some(hex::encode(self.identity.node_id().as_bytes())))
        } else {
            (None, None)
        };
        ServerInfo {
            enode,
            id,
            ip: self.config.host.clone(),
            listen_addr: format!("[{}]:{}", self.config.host, self.bound_tcp_port),
            ports: Ports {
                discovery: self.config.discovery_port,
                listener: self.bound_tcp_port,
            },
        }
    }

    pub async fn peer_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    fn enode_url(&self) -> String {
        format!(
            "enode://{}@[{}]:{}",
            hex::encode(self.identity.node_id().as_bytes()),
            self.config.host,
            self.bound_tcp_port
        )
    }
}

/// spec.md §4.9's default `maxAge` for `ban()`.
pub const DEFAULT_BAN_MAX_AGE_MILLIS: u64 = 60_000;

impl PeerRegistry {
    fn clear(&mut self) {
        let ids: Vec<String> = self.iter().map(|r| r.id.clone()).collect();
        for id in ids {
            self.remove(&id);
        }
    }
}

fn spawn_dispatch_loop(
    mut discovery_events: tokio::sync::mpsc::UnboundedReceiver<DiscoveryEvent>,
    mut mux_events: tokio::sync::mpsc::UnboundedReceiver<MuxEvent>,
    registry: Arc<Mutex<PeerRegistry>>,
    sink: Arc<dyn ServerSink>,
    metrics: Option<Arc<Metrics>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = discovery_events.recv() => {
                    match event {
                        DiscoveryEvent::Error(message) => {
                            if !is_ignored(&message) {
                                tracing::warn!(%message, "discovery transport error");
                                sink.error(message, None);
                            }
                            if let Some(metrics) = &metrics {
                                metrics.discovery_bootstrap_failures_total.inc();
                            }
                        }
                    }
                }
                Some(event) = mux_events.recv() => {
                    dispatch_mux_event(event, &registry, &sink, &metrics).await;
                }
                else => break,
            }
        }
    })
}

async fn dispatch_mux_event(
    event: MuxEvent,
    registry: &Arc<Mutex<PeerRegistry>>,
    sink: &Arc<dyn ServerSink>,
    metrics: &Option<Arc<Metrics>>,
) {
    match event {
        MuxEvent::Connected(record) => {
            registry.lock().await.insert(record.clone());
            if let Some(metrics) = metrics {
                metrics.p2p_connects_total.inc();
                metrics.p2p_peers.set(registry.lock().await.len() as i64);
            }
            sink.connected(record);
        }
        MuxEvent::Disconnected { id, reason } => {
            let removed = registry.lock().await.remove(&id);
            if let Some(metrics) = metrics {
                metrics.p2p_disconnects_total.inc();
                metrics.p2p_peers.set(registry.lock().await.len() as i64);
            }
            if let Some(record) = removed {
                sink.disconnected(record, reason);
            }
        }
        MuxEvent::Error(message) => {
            if !is_ignored(&message) {
                tracing::warn!(%message, "session transport error");
                sink.error(message, None);
            }
            if let Some(metrics) = metrics {
                metrics.p2p_errors_total.inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::types::ListeningInfo as LI;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct RecordingSink {
        connected: AtomicUsize,
        disconnected: AtomicUsize,
    }

    impl ServerSink for RecordingSink {
        fn connected(&self, _record: PeerRecord) {
            self.connected.fetch_add(1, Ordering::SeqCst);
        }
        fn disconnected(&self, _record: PeerRecord, _reason: Reason) {
            self.disconnected.fetch_add(1, Ordering::SeqCst);
        }
        fn listening(&self, _info: LI) {}
        fn error(&self, _error: String, _peer: Option<PeerRecord>) {}
    }

    fn config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            discovery_port: 0,
            bootnodes: vec![],
            client_filter: vec![],
            max_peers: 25,
            refresh_interval: Duration::from_secs(30),
            protocols: ["eth/68".to_string()].into_iter().collect(),
            client_id: "chainnode/0.1.0".to_string(),
        }
    }

    #[tokio::test]
    async fn lifecycle_is_idle_starting_running_stopping_idle() {
        let dir = tempdir().unwrap();
        let identity = NodeIdentity::load_or_create(dir.path()).unwrap();
        let sink = Arc::new(RecordingSink {
            connected: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
        });
        let mut server = P2PServer::new(identity, config(), sink);
        assert_eq!(server.state().await, LifecycleState::Idle);

        server.start().await.unwrap();
        assert_eq!(server.state().await, LifecycleState::Running);

        server.stop().await.unwrap();
        assert_eq!(server.state().await, LifecycleState::Idle);
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let dir = tempdir().unwrap();
        let identity = NodeIdentity::load_or_create(dir.path()).unwrap();
        let sink = Arc::new(RecordingSink {
            connected: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
        });
        let mut server = P2PServer::new(identity, config(), sink);
        server.start().await.unwrap();
        assert!(matches!(server.start().await, Err(ServerError::AlreadyStarting)));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_while_idle_is_rejected() {
        let dir = tempdir().unwrap();
        let identity = NodeIdentity::load_or_create(dir.path()).unwrap();
        let sink = Arc::new(RecordingSink {
            connected: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
        });
        let mut server = P2PServer::new(identity, config(), sink);
        assert!(matches!(server.stop().await, Err(ServerError::NotRunning)));
    }

    /// spec.md §4.9: `ban` forwards to `DiscoveryTable` when started, else
    /// returns `false`.
    #[tokio::test]
    async fn ban_returns_false_before_start_and_true_once_running() {
        let dir = tempdir().unwrap();
        let identity = NodeIdentity::load_or_create(dir.path()).unwrap();
        let sink = Arc::new(RecordingSink {
            connected: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
        });
        let mut server = P2PServer::new(identity, config(), sink);
        assert!(!server.ban("deadbeef", DEFAULT_BAN_MAX_AGE_MILLIS).await);

        server.start().await.unwrap();
        assert!(server.ban_default("deadbeef").await);

        server.stop().await.unwrap();
    }

    /// spec.md §4.9: `enode`/`id` are absent before the session multiplexer
    /// is initialized, present (and enode host-bracketed) afterward.
    #[tokio::test]
    async fn info_enode_absent_until_running_then_bracketed() {
        let dir = tempdir().unwrap();
        let identity = NodeIdentity::load_or_create(dir.path()).unwrap();
        let sink = Arc::new(RecordingSink {
            connected: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
        });
        let mut server = P2PServer::new(identity, config(), sink);

        let before = server.info();
        assert!(before.enode.is_none());
        assert!(before.id.is_none());

        server.start().await.unwrap();
        let after = server.info();
        assert!(after.enode.as_ref().unwrap().contains("@[127.0.0.1]:"));
        assert!(after.id.is_some());
        assert_eq!(after.listen_addr, format!("[127.0.0.1]:{}", after.ports.listener));

        server.stop().await.unwrap();
    }
}
