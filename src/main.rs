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

//! Chainnode node entrypoint: loads configuration, brings up the P2P
//! server, and keeps the process alive until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use chainnode::config::NodeConfig;
use chainnode::monitoring::metrics::Metrics;
use chainnode::network::identity::NodeIdentity;
use chainnode::network::server::{P2PServer, ServerConfig};
use chainnode::network::types::{ListeningInfo, PeerRecord, Reason, ServerSink};

struct TracingSink;

impl ServerSink for TracingSink {
    fn connected(&self, record: PeerRecord) {
        info!(peer = %record.id, host = %record.host, port = record.port, inbound = record.inbound, "peer connected");
    }

    fn disconnected(&self, record: PeerRecord, reason: Reason) {
        info!(peer = %record.id, ?reason, "peer disconnected");
    }

    fn listening(&self, info: ListeningInfo) {
        info!(transport = info.transport, url = %info.url, "listening");
    }

    fn error(&self, error: String, peer: Option<PeerRecord>) {
        match peer {
            Some(record) => warn!(peer = %record.id, %error, "peer error"),
            None => warn!(%error, "server error"),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::var("CHAINNODE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("chainnode.toml"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let config =
        NodeConfig::load_or_default(&config_path()).context("loading node configuration")?;

    let metrics = Arc::new(Metrics::new().expect("metrics registration failed"));

    let identity =
        NodeIdentity::load_or_create(&config.data_dir).context("loading node identity")?;

    info!(
        node_id = %hex::encode(identity.node_id().as_bytes()),
        data_dir = %config.data_dir.display(),
        port = config.port,
        discovery_port = config.discovery_port,
        "chainnode starting"
    );

    let server_config = ServerConfig {
        host: config.host.clone(),
        port: config.port,
        discovery_port: config.discovery_port,
        bootnodes: config.bootnode_endpoints(),
        client_filter: config.client_filter.clone(),
        max_peers: config.max_peers,
        refresh_interval: config.refresh_interval(),
        protocols: config.protocols.clone(),
        client_id: config.client_id.clone(),
    };

    let mut server =
        P2PServer::new(identity, server_config, Arc::new(TracingSink)).with_metrics(metrics);

    server.start().await.context("starting P2P server")?;

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => warn!(%err, "failed to install shutdown signal handler"),
    }

    if let Err(err) = server.stop().await {
        warn!(%err, "error while stopping P2P server");
    }

    // Give in-flight session teardown a moment before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
