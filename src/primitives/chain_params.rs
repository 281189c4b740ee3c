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

//! `ChainParams`: keyed lookup of protocol constants by (section, name, hardfork).
//!
//! This crate only needs a reader; chain-spec file formats, genesis JSON
//! parsing, and runtime chain selection are an external collaborator's
//! responsibility per the design's scope.

use std::collections::BTreeMap;

use ethereum_types::{H256, U256};

use super::hardfork::Hardfork;

/// Consensus family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusType {
    Pow,
    Poa,
}

/// Concrete consensus algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusAlgorithm {
    Ethash,
    Clique,
}

/// Clique tuning parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusConfig {
    /// Minimum seconds between blocks.
    pub period: u64,
    /// Block interval between signer-list checkpoints.
    pub epoch: u64,
}

/// Canonical genesis field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisValues {
    pub gas_limit: U256,
    pub timestamp: U256,
    pub difficulty: U256,
    pub extra_data: Vec<u8>,
    pub nonce: [u8; 8],
    pub state_root: H256,
}

/// Errors raised by a `ChainParams` lookup.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ChainParamsError {
    #[error("unknown chain parameter {section}/{name} at hardfork {hardfork}")]
    UnknownParam {
        section: &'static str,
        name: &'static str,
        hardfork: &'static str,
    },
}

/// Keyed lookup of protocol constants, resolved per hardfork.
pub trait ChainParams: Send + Sync {
    /// Look up a numeric constant for `(section, name)` at `hardfork`.
    fn param_by_hardfork(
        &self,
        section: &'static str,
        name: &'static str,
        hardfork: Hardfork,
    ) -> Result<U256, ChainParamsError>;

    /// `pow` or `poa`.
    fn consensus_type(&self) -> ConsensusType;

    /// `ethash`, `clique`, ...
    fn consensus_algorithm(&self) -> ConsensusAlgorithm;

    /// Clique period/epoch (meaningless outside a clique chain).
    fn consensus_config(&self) -> ConsensusConfig;

    /// Canonical genesis field values.
    fn genesis(&self) -> GenesisValues;

    /// `true` iff `a`'s rank is >= `b`'s.
    fn hardfork_gte(&self, a: Hardfork, b: Hardfork) -> bool {
        a.is_gte(b)
    }

    /// The hardfork active at `number`, per this chain's activation schedule.
    fn active_hardfork_at(&self, number: U256) -> Hardfork;

    /// The block number at which `name` activates, if it is scheduled at all.
    fn hardfork_block(&self, name: Hardfork) -> Option<U256>;

    /// `true` iff `name` is scheduled on this chain (at any block).
    fn is_hardfork_active(&self, name: Hardfork) -> bool {
        self.hardfork_block(name).is_some()
    }

    /// Active EIP numbers (used by the transaction factory, §4.5).
    fn eips(&self) -> &[u32];
}

/// An in-memory `ChainParams` table, sufficient to drive validation and
/// tests; not a general chain-spec file reader.
#[derive(Clone, Debug)]
pub struct StaticChainParams {
    params: BTreeMap<(&'static str, &'static str, Hardfork), U256>,
    consensus_type: ConsensusType,
    consensus_algorithm: ConsensusAlgorithm,
    consensus_config: ConsensusConfig,
    genesis: GenesisValues,
    /// Ascending `(block, hardfork)` activation schedule.
    schedule: Vec<(U256, Hardfork)>,
    eips: Vec<u32>,
}

impl StaticChainParams {
    /// Construct an empty table for `consensus_algorithm`; callers populate
    /// parameters with [`Self::with_param`] and the fork schedule with
    /// [`Self::with_fork`].
    pub fn new(consensus_algorithm: ConsensusAlgorithm, genesis: GenesisValues) -> Self {
        let consensus_type = match consensus_algorithm {
            ConsensusAlgorithm::Ethash => ConsensusType::Pow,
            ConsensusAlgorithm::Clique => ConsensusType::Poa,
        };
        Self {
            params: BTreeMap::new(),
            consensus_type,
            consensus_algorithm,
            consensus_config: ConsensusConfig { period: 15, epoch: 30_000 },
            genesis,
            schedule: vec![(U256::zero(), Hardfork::Chainstart)],
            eips: Vec::new(),
        }
    }

    /// Set the clique period/epoch (ignored for PoW chains).
    pub fn with_consensus_config(mut self, cfg: ConsensusConfig) -> Self {
        self.consensus_config = cfg;
        self
    }

    /// Register a numeric parameter.
    pub fn with_param(
        mut self,
        section: &'static str,
        name: &'static str,
        hardfork: Hardfork,
        value: impl Into<U256>,
    ) -> Self {
        self.params.insert((section, name, hardfork), value.into());
        self
    }

    /// Register `hardfork`'s activation block. Forks must be added in
    /// ascending block order; chainstart at block 0 is implicit.
    pub fn with_fork(mut self, hardfork: Hardfork, block: impl Into<U256>) -> Self {
        self.schedule.push((block.into(), hardfork));
        self.schedule.sort_by_key(|(b, _)| *b);
        self
    }

    /// Enable an EIP (affects `TransactionFactory` dispatch).
    pub fn with_eip(mut self, eip: u32) -> Self {
        self.eips.push(eip);
        self
    }
}

impl ChainParams for StaticChainParams {
    fn param_by_hardfork(
        &self,
        section: &'static str,
        name: &'static str,
        hardfork: Hardfork,
    ) -> Result<U256, ChainParamsError> {
        // Parameters are looked up at the requested hardfork and, failing
        // that, at the highest earlier hardfork that defines them — mirrors
        // how a real chain-params table resolves "as of" a given fork.
        self.params
            .iter()
            .filter(|((s, n, hf), _)| *s == section && *n == name && hf.rank() <= hardfork.rank())
            .max_by_key(|((_, _, hf), _)| hf.rank())
            .map(|(_, v)| *v)
            .ok_or(ChainParamsError::UnknownParam {
                section,
                name,
                hardfork: hardfork.name(),
            })
    }

    fn consensus_type(&self) -> ConsensusType {
        self.consensus_type
    }

    fn consensus_algorithm(&self) -> ConsensusAlgorithm {
        self.consensus_algorithm
    }

    fn consensus_config(&self) -> ConsensusConfig {
        self.consensus_config
    }

    fn genesis(&self) -> GenesisValues {
        self.genesis.clone()
    }

    fn active_hardfork_at(&self, number: U256) -> Hardfork {
        self.schedule
            .iter()
            .rev()
            .find(|(block, _)| *block <= number)
            .map(|(_, hf)| *hf)
            .unwrap_or(Hardfork::Chainstart)
    }

    fn hardfork_block(&self, name: Hardfork) -> Option<U256> {
        self.schedule.iter().find(|(_, hf)| *hf == name).map(|(b, _)| *b)
    }

    fn eips(&self) -> &[u32] {
        &self.eips
    }
}
