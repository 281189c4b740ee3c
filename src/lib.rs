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

//! Chainnode — a devp2p-style peer-to-peer server paired with a
//! block-header consensus validator.
//!
//! This crate provides:
//! - Canonical header RLP codec, hashing, and hardfork-aware difficulty
//! - Clique proof-of-authority signer rules and DAO-fork extraData gating
//! - A UDP node-discovery table and encrypted TCP session multiplexer
//! - A top-level `P2PServer` orchestrator with peer admission and eviction
//! - Structured logging and Prometheus metrics

/// Header data model, RLP codec, hardfork identity, and `ChainParams`.
pub mod primitives;
/// Header validation, canonical difficulty, and clique rules.
pub mod consensus;
/// Thin transaction-envelope classifier.
pub mod transaction;
/// Observability (Prometheus metrics, structured logging helpers).
pub mod monitoring;
/// P2P networking stack (discovery, session transport, peer registry, server).
pub mod network;
/// Node configuration loading.
pub mod config;
