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

//! `NodeConfig` (spec.md §10.3): TOML-backed node configuration, in the
//! same shape as the teacher's `networking::p2p::P2pConfig` but re-pointed
//! at this crate's listen/discovery/bootnode/hardfork surface.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::network::types::Endpoint;

/// A bootnode entry as it appears in the TOML config, before being parsed
/// into a [`Endpoint`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootnodeEntry {
    pub address: String,
    pub udp_port: u16,
    pub tcp_port: u16,
}

impl From<&BootnodeEntry> for Endpoint {
    fn from(entry: &BootnodeEntry) -> Self {
        Endpoint {
            address: entry.address.clone(),
            udp_port: entry.udp_port,
            tcp_port: entry.tcp_port,
        }
    }
}

/// Hardfork activation override, `name` resolved via
/// [`crate::primitives::Hardfork::from_name`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HardforkOverride {
    pub name: String,
    pub block: u64,
}

/// Top-level node configuration, loaded from a TOML file or defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory holding the node's persisted identity and other state.
    pub data_dir: PathBuf,
    /// Host the discovery and session listeners bind to.
    pub host: String,
    /// TCP port for the session multiplexer; 0 disables listening.
    pub port: u16,
    /// UDP port for the discovery table; 0 disables binding.
    pub discovery_port: u16,
    /// Bootnodes seeded into the discovery table at startup.
    pub bootnodes: Vec<BootnodeEntry>,
    /// Remote client-id substrings allowed to complete a session handshake;
    /// empty means allow all.
    pub client_filter: Vec<String>,
    /// Maximum number of concurrently admitted peers.
    pub max_peers: u32,
    /// Interval between discovery-table refresh sweeps, in seconds.
    pub refresh_interval_secs: u64,
    /// Advertised application-layer capabilities (e.g. `"eth/68"`).
    pub protocols: BTreeSet<String>,
    /// Client identifier string exchanged during the session handshake.
    pub client_id: String,
    /// Chain id used purely for display/logging; `StaticChainParams`
    /// construction is the caller's responsibility per spec.md's scope.
    pub chain_id: u64,
    /// Hardfork activation-block overrides, applied over the built-in
    /// schedule the caller selects.
    pub hardfork_overrides: Vec<HardforkOverride>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            host: "0.0.0.0".to_string(),
            port: 30303,
            discovery_port: 30303,
            bootnodes: Vec::new(),
            client_filter: Vec::new(),
            max_peers: 25,
            refresh_interval_secs: 30,
            protocols: ["eth/68".to_string()].into_iter().collect(),
            client_id: format!("chainnode/v{}", env!("CARGO_PKG_VERSION")),
            chain_id: 1,
            hardfork_overrides: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Loads a `NodeConfig` from `path`, falling back to defaults for any
    /// field the file omits (via `#[serde(default)]`).
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: NodeConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Loads from `path` if it exists, else returns [`NodeConfig::default`].
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn bootnode_endpoints(&self) -> Vec<Endpoint> {
        self.bootnodes.iter().map(Endpoint::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.port, 30303);
        assert!(cfg.protocols.contains("eth/68"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NodeConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.max_peers, NodeConfig::default().max_peers);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chainnode.toml");
        fs::write(&path, "port = 40404\nmax_peers = 50\n").unwrap();
        let cfg = NodeConfig::load(&path).unwrap();
        assert_eq!(cfg.port, 40404);
        assert_eq!(cfg.max_peers, 50);
        assert_eq!(cfg.host, NodeConfig::default().host);
    }

    #[test]
    fn bootnode_entries_convert_to_endpoints() {
        let cfg = NodeConfig {
            bootnodes: vec![BootnodeEntry {
                address: "10.0.0.1".to_string(),
                udp_port: 30303,
                tcp_port: 30303,
            }],
            ..NodeConfig::default()
        };
        let endpoints = cfg.bootnode_endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].address, "10.0.0.1");
    }
}
