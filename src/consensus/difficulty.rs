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

//! Canonical PoW difficulty, including the ice-age bomb-delay adjustment,
//! and the parent-relative gas-limit bound shared with `HeaderValidator`.

use ethereum_types::U256;

use crate::primitives::chain_params::{ChainParams, ConsensusType};
use crate::primitives::constants::KECCAK256_RLP_ARRAY;
use crate::primitives::errors::ConsensusError;
use crate::primitives::hardfork::Hardfork;
use crate::primitives::header::BlockHeader;

pub struct DifficultyEngine;

impl DifficultyEngine {
    /// `canonicalDifficulty(header, parent)` — PoW only.
    pub fn canonical_difficulty(
        header: &BlockHeader,
        parent: &BlockHeader,
        chain_params: &dyn ChainParams,
    ) -> Result<U256, ConsensusError> {
        if chain_params.consensus_type() != ConsensusType::Pow {
            return Err(ConsensusError::UnsupportedConsensus);
        }

        let h = chain_params.active_hardfork_at(header.number());
        let bound_divisor =
            chain_params.param_by_hardfork("pow", "difficultyBoundDivisor", h)?;
        let min_difficulty = chain_params.param_by_hardfork("pow", "minimumDifficulty", h)?;
        let bound = parent.difficulty() / bound_divisor;

        let delta_t = signed_delta(header.timestamp(), parent.timestamp());

        let mut dif = if h.is_gte(Hardfork::Byzantium) {
            let uncle_addend = if parent.uncle_hash() == KECCAK256_RLP_ARRAY { 1 } else { 2 };
            let a = (uncle_addend - delta_t / 9).max(-99);
            apply_signed(parent.difficulty(), bound, a)
        } else if h.is_gte(Hardfork::Homestead) {
            let a = (1 - delta_t / 10).max(-99);
            apply_signed(parent.difficulty(), bound, a)
        } else {
            let duration_limit = chain_params.param_by_hardfork("pow", "durationLimit", h)?;
            if parent.timestamp() + duration_limit > header.timestamp() {
                parent.difficulty() + bound
            } else {
                parent.difficulty().saturating_sub(bound)
            }
        };

        let mut num = header.number();
        if h.is_gte(Hardfork::MuirGlacier) {
            num = num.saturating_sub(U256::from(9_000_000u64));
        } else if h.is_gte(Hardfork::Constantinople) {
            num = num.saturating_sub(U256::from(5_000_000u64));
        } else if h.is_gte(Hardfork::Byzantium) {
            num = num.saturating_sub(U256::from(3_000_000u64));
        }

        let quotient = num / U256::from(100_000u64);
        if quotient >= U256::from(2u64) {
            let exp = quotient - U256::from(2u64);
            dif += U256::from(2u64).pow(exp);
        }

        if dif < min_difficulty {
            dif = min_difficulty;
        }

        Ok(dif)
    }

    /// §4.3 gas-limit bounds, shared with `HeaderValidator` step 7.
    pub fn check_gas_limit(
        header: &BlockHeader,
        parent: &BlockHeader,
        chain_params: &dyn ChainParams,
    ) -> Result<(), ConsensusError> {
        let h = chain_params.active_hardfork_at(header.number());
        let bound_divisor =
            chain_params.param_by_hardfork("gasConfig", "gasLimitBoundDivisor", h)?;
        let min_gas_limit = chain_params.param_by_hardfork("gasConfig", "minGasLimit", h)?;
        let a = parent.gas_limit() / bound_divisor;

        let lower = parent.gas_limit().saturating_sub(a);
        let upper = parent.gas_limit() + a;
        if header.gas_limit() <= lower || header.gas_limit() >= upper {
            return Err(ConsensusError::InvalidGasLimit);
        }
        if header.gas_limit() < min_gas_limit {
            return Err(ConsensusError::InvalidGasLimit);
        }
        Ok(())
    }
}

/// `header.timestamp - parent.timestamp` as a signed delta; header
/// timestamps are validated strictly increasing before this runs, so the
/// value is always non-negative in practice, but the arithmetic below is
/// expressed in signed terms to mirror the branch formulas directly.
fn signed_delta(later: U256, earlier: U256) -> i64 {
    later.saturating_sub(earlier).as_u64() as i64
}

fn apply_signed(base: U256, bound: U256, a: i64) -> U256 {
    if a >= 0 {
        base + bound * U256::from(a as u64)
    } else {
        base.saturating_sub(bound * U256::from((-a) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::chain_params::{ConsensusAlgorithm, GenesisValues, StaticChainParams};
    use crate::primitives::header::{HeaderFields, HeaderOpts};
    use ethereum_types::H256;

    fn pow_params() -> StaticChainParams {
        StaticChainParams::new(
            ConsensusAlgorithm::Ethash,
            GenesisValues {
                gas_limit: U256::from(5000u64),
                timestamp: U256::zero(),
                difficulty: U256::from(17_179_869_184u64),
                extra_data: Vec::new(),
                nonce: [0u8; 8],
                state_root: H256::zero(),
            },
        )
        .with_param("pow", "minimumDifficulty", Hardfork::Chainstart, 131_072u64)
        .with_param("pow", "difficultyBoundDivisor", Hardfork::Chainstart, 2048u64)
        .with_param("pow", "durationLimit", Hardfork::Chainstart, 13u64)
        .with_fork(Hardfork::Homestead, 1_150_000u64)
        .with_fork(Hardfork::Dao, 1_920_000u64)
        .with_fork(Hardfork::Byzantium, 4_370_000u64)
    }

    /// S1: byzantium difficulty, no uncles.
    #[test]
    fn byzantium_no_uncles_matches_worked_example() {
        let cp = pow_params();
        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                difficulty: Some(U256::from(1_000_000_000_000u64)),
                timestamp: Some(U256::from(1_000_000u64)),
                uncle_hash: Some(KECCAK256_RLP_ARRAY),
                number: Some(U256::from(5_000_000u64 - 1)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let header = BlockHeader::from_field_dict(
            HeaderFields {
                timestamp: Some(U256::from(1_000_009u64)),
                number: Some(U256::from(5_000_000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();

        let dif = DifficultyEngine::canonical_difficulty(&header, &parent, &cp).unwrap();
        assert_eq!(dif, U256::from(1_000_000_262_144u64));
    }

    #[test]
    fn difficulty_never_drops_below_floor() {
        let cp = pow_params();
        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                difficulty: Some(U256::from(131_072u64)),
                timestamp: Some(U256::from(1u64)),
                number: Some(U256::zero()),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let header = BlockHeader::from_field_dict(
            HeaderFields {
                timestamp: Some(U256::from(10_000u64)),
                number: Some(U256::from(1u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let dif = DifficultyEngine::canonical_difficulty(&header, &parent, &cp).unwrap();
        assert!(dif >= U256::from(131_072u64));
    }

    #[test]
    fn gas_limit_enforces_strict_inequality() {
        let cp = pow_params().with_param(
            "gasConfig",
            "gasLimitBoundDivisor",
            Hardfork::Chainstart,
            1024u64,
        )
        .with_param("gasConfig", "minGasLimit", Hardfork::Chainstart, 5000u64);

        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                gas_limit: Some(U256::from(1_000_000u64)),
                number: Some(U256::zero()),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let a = U256::from(1_000_000u64) / U256::from(1024u64);

        let exactly_bound = BlockHeader::from_field_dict(
            HeaderFields {
                gas_limit: Some(U256::from(1_000_000u64) + a),
                number: Some(U256::from(1u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        assert!(DifficultyEngine::check_gas_limit(&exactly_bound, &parent, &cp).is_err());

        let just_under = BlockHeader::from_field_dict(
            HeaderFields {
                gas_limit: Some(U256::from(1_000_000u64) + a - U256::from(1u64)),
                number: Some(U256::from(1u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        assert!(DifficultyEngine::check_gas_limit(&just_under, &parent, &cp).is_ok());
    }
}
