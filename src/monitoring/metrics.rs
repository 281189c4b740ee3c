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
#![warn(missing_docs)]

use prometheus::{IntCounter, IntGauge, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Connected peers gauge.
    pub p2p_peers: IntGauge,
    /// Successful inbound+outbound session admissions.
    pub p2p_connects_total: IntCounter,
    /// Peer-removed events.
    pub p2p_disconnects_total: IntCounter,
    /// Surfaced (non-ignored) transport errors.
    pub p2p_errors_total: IntCounter,
    /// `banPeer` invocations.
    pub p2p_banned_total: IntCounter,
    /// Bootstrap-node dial failures.
    pub discovery_bootstrap_failures_total: IntCounter,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let p2p_peers =
            IntGauge::new("chainnode_p2p_peers", "Connected peers").map_err(|_| MetricsError::Prom)?;
        let p2p_connects_total = IntCounter::new(
            "chainnode_p2p_connects_total",
            "Successful peer session admissions",
        )
        .map_err(|_| MetricsError::Prom)?;
        let p2p_disconnects_total =
            IntCounter::new("chainnode_p2p_disconnects_total", "Peer-removed events")
                .map_err(|_| MetricsError::Prom)?;
        let p2p_errors_total =
            IntCounter::new("chainnode_p2p_errors_total", "Surfaced transport errors")
                .map_err(|_| MetricsError::Prom)?;
        let p2p_banned_total = IntCounter::new("chainnode_p2p_banned_total", "banPeer invocations")
            .map_err(|_| MetricsError::Prom)?;
        let discovery_bootstrap_failures_total = IntCounter::new(
            "chainnode_discovery_bootstrap_failures_total",
            "Bootstrap-node dial failures",
        )
        .map_err(|_| MetricsError::Prom)?;

        registry.register(Box::new(p2p_peers.clone())).map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(p2p_connects_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(p2p_disconnects_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(p2p_errors_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(p2p_banned_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(discovery_bootstrap_failures_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            p2p_peers,
            p2p_connects_total,
            p2p_disconnects_total,
            p2p_errors_total,
            p2p_banned_total,
            discovery_bootstrap_failures_total,
        })
    }
}
