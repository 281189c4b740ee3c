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

//! Pure header validation against a parent, delegating numeric rules to
//! `DifficultyEngine` and extraData layout rules to `CliqueRules`.

use ethereum_types::U256;

use crate::primitives::chain_params::{ChainParams, ConsensusAlgorithm, ConsensusType};
use crate::primitives::errors::ConsensusError;
use crate::primitives::header::{Address, BlockHeader};

use super::clique::CliqueRules;
use super::difficulty::DifficultyEngine;
use super::header_store::HeaderStore;

pub struct HeaderValidator;

impl HeaderValidator {
    /// `validate(header, blockchain, uncleHeight?)`. Genesis headers
    /// (`number == 0`) short-circuit to success.
    pub fn validate(
        header: &BlockHeader,
        store: &dyn HeaderStore,
        chain_params: &dyn ChainParams,
        uncle_height: Option<U256>,
    ) -> Result<(), ConsensusError> {
        if header.is_genesis() {
            return Ok(());
        }

        Self::check_extra_data_bound(header, chain_params)?;

        let parent = store
            .header(header.parent_hash())
            .ok_or(ConsensusError::MissingParent)?;

        if header.number() != parent.number() + U256::one() {
            return Err(ConsensusError::InvalidNumber);
        }

        if header.timestamp() <= parent.timestamp() {
            return Err(ConsensusError::InvalidTimestamp);
        }

        if chain_params.consensus_algorithm() == ConsensusAlgorithm::Clique {
            let period = U256::from(chain_params.consensus_config().period);
            if parent.timestamp() + period > header.timestamp() {
                return Err(ConsensusError::InvalidCliquePeriod);
            }
        }

        if chain_params.consensus_type() == ConsensusType::Pow {
            let expected = DifficultyEngine::canonical_difficulty(header, &parent, chain_params)?;
            if expected != header.difficulty() {
                return Err(ConsensusError::InvalidDifficulty);
            }
        }

        DifficultyEngine::check_gas_limit(header, &parent, chain_params)?;

        if let Some(uncle_height) = uncle_height {
            let diff = uncle_height
                .checked_sub(parent.number())
                .ok_or(ConsensusError::InvalidUncleDistance)?;
            if diff <= U256::one() || diff >= U256::from(8u64) {
                return Err(ConsensusError::InvalidUncleDistance);
            }
        }

        Ok(())
    }

    fn check_extra_data_bound(
        header: &BlockHeader,
        chain_params: &dyn ChainParams,
    ) -> Result<(), ConsensusError> {
        if chain_params.consensus_algorithm() != ConsensusAlgorithm::Clique {
            let h = chain_params.active_hardfork_at(header.number());
            let max_extra = chain_params.param_by_hardfork("vm", "maxExtraDataSize", h)?;
            if U256::from(header.extra_data().len()) > max_extra {
                return Err(ConsensusError::InvalidCliqueExtraData);
            }
            return Ok(());
        }

        const MIN_LEN: usize = 32 + 65;
        let len = header.extra_data().len();
        if !CliqueRules::is_epoch_transition(header, chain_params)? {
            if len != MIN_LEN {
                return Err(ConsensusError::InvalidCliqueExtraData);
            }
        } else {
            if len < MIN_LEN || (len - MIN_LEN) % 20 != 0 {
                return Err(ConsensusError::InvalidCliqueExtraData);
            }
            if header.coinbase() != Address::zero() {
                return Err(ConsensusError::InvalidCliqueCoinbase);
            }
            if header.mix_hash() != ethereum_types::H256::zero() {
                return Err(ConsensusError::InvalidCliqueMixHash);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::chain_params::{ConsensusConfig, GenesisValues, StaticChainParams};
    use crate::primitives::hardfork::Hardfork;
    use crate::primitives::header::{HeaderFields, HeaderOpts};
    use ethereum_types::H256;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapStore(Mutex<HashMap<H256, BlockHeader>>);

    impl HeaderStore for MapStore {
        fn header(&self, parent_hash: H256) -> Option<BlockHeader> {
            self.0.lock().unwrap().get(&parent_hash).cloned()
        }
    }

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
        .with_param("gasConfig", "gasLimitBoundDivisor", Hardfork::Chainstart, 1024u64)
        .with_param("gasConfig", "minGasLimit", Hardfork::Chainstart, 5000u64)
        .with_param("vm", "maxExtraDataSize", Hardfork::Chainstart, 32u64)
    }

    #[test]
    fn missing_parent_is_surfaced() {
        let cp = pow_params();
        let store = MapStore(Mutex::new(HashMap::new()));
        let header = BlockHeader::from_field_dict(
            HeaderFields {
                number: Some(U256::from(1u64)),
                difficulty: Some(U256::from(131_072u64)),
                gas_limit: Some(U256::from(5000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let err = HeaderValidator::validate(&header, &store, &cp, None).unwrap_err();
        assert_eq!(err, ConsensusError::MissingParent);
    }

    #[test]
    fn equal_timestamp_is_rejected() {
        let cp = pow_params();
        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                number: Some(U256::zero()),
                timestamp: Some(U256::from(1000u64)),
                difficulty: Some(U256::from(131_072u64)),
                gas_limit: Some(U256::from(5000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let parent_hash = parent.hash(&cp);
        let mut map = HashMap::new();
        map.insert(parent_hash, parent.clone());
        let store = MapStore(Mutex::new(map));

        let header = BlockHeader::from_field_dict(
            HeaderFields {
                parent_hash: Some(parent_hash),
                number: Some(U256::from(1u64)),
                timestamp: Some(U256::from(1000u64)),
                difficulty: Some(U256::from(131_072u64)),
                gas_limit: Some(U256::from(5000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();

        let err = HeaderValidator::validate(&header, &store, &cp, None).unwrap_err();
        assert_eq!(err, ConsensusError::InvalidTimestamp);
    }

    #[test]
    fn genesis_header_always_validates() {
        let cp = pow_params();
        let store = MapStore(Mutex::new(HashMap::new()));
        let header = BlockHeader::from_field_dict(
            HeaderFields { number: Some(U256::zero()), ..Default::default() },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        assert!(HeaderValidator::validate(&header, &store, &cp, None).is_ok());
    }

    /// S2: clique epoch transition.
    #[test]
    fn clique_epoch_transition_validates() {
        let cp = StaticChainParams::new(
            ConsensusAlgorithm::Clique,
            GenesisValues {
                gas_limit: U256::from(8_000_000u64),
                timestamp: U256::zero(),
                difficulty: U256::from(1u64),
                extra_data: vec![0u8; 97],
                nonce: [0u8; 8],
                state_root: H256::zero(),
            },
        )
        .with_consensus_config(ConsensusConfig { period: 15, epoch: 30_000 })
        .with_param("gasConfig", "gasLimitBoundDivisor", Hardfork::Chainstart, 1024u64)
        .with_param("gasConfig", "minGasLimit", Hardfork::Chainstart, 5000u64);

        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                number: Some(U256::from(59_999u64)),
                timestamp: Some(U256::from(1_000u64)),
                difficulty: Some(U256::from(1u64)),
                gas_limit: Some(U256::from(8_000_000u64)),
                extra_data: Some(vec![0u8; 97]),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let parent_hash = parent.hash(&cp);
        let mut map = HashMap::new();
        map.insert(parent_hash, parent.clone());
        let store = MapStore(Mutex::new(map));

        let addr1 = Address::repeat_byte(0xAA);
        let addr2 = Address::repeat_byte(0xBB);
        let mut extra = vec![0u8; 32];
        extra.extend_from_slice(addr1.as_bytes());
        extra.extend_from_slice(addr2.as_bytes());
        extra.extend(vec![0u8; 65]);

        let header = BlockHeader::from_field_dict(
            HeaderFields {
                parent_hash: Some(parent_hash),
                number: Some(U256::from(60_000u64)),
                timestamp: Some(U256::from(1_020u64)),
                difficulty: Some(U256::from(1u64)),
                gas_limit: Some(U256::from(8_000_000u64)),
                extra_data: Some(extra),
                coinbase: Some(Address::zero()),
                mix_hash: Some(H256::zero()),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();

        assert!(HeaderValidator::validate(&header, &store, &cp, None).is_ok());
        let signers = CliqueRules::epoch_transition_signers(&header, &cp).unwrap();
        assert_eq!(signers, vec![addr1, addr2]);
    }

    #[test]
    fn uncle_distance_must_be_between_one_and_eight() {
        let cp = pow_params();
        let parent = BlockHeader::from_field_dict(
            HeaderFields {
                number: Some(U256::from(10u64)),
                timestamp: Some(U256::from(1000u64)),
                difficulty: Some(U256::from(131_072u64)),
                gas_limit: Some(U256::from(5000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();
        let parent_hash = parent.hash(&cp);
        let mut map = HashMap::new();
        map.insert(parent_hash, parent.clone());
        let store = MapStore(Mutex::new(map));

        // parent.timestamp(1000) + durationLimit(13) > header.timestamp(1010),
        // so the pre-homestead branch adds the full bound: 131_072 + 131_072/2048.
        let header = BlockHeader::from_field_dict(
            HeaderFields {
                parent_hash: Some(parent_hash),
                number: Some(U256::from(11u64)),
                timestamp: Some(U256::from(1010u64)),
                difficulty: Some(U256::from(131_136u64)),
                gas_limit: Some(U256::from(5000u64)),
                ..Default::default()
            },
            HeaderOpts::default(),
            &cp,
        )
        .unwrap();

        assert!(HeaderValidator::validate(&header, &store, &cp, Some(U256::from(18u64))).is_ok());
        assert_eq!(
            HeaderValidator::validate(&header, &store, &cp, Some(U256::from(11u64))).unwrap_err(),
            ConsensusError::InvalidUncleDistance
        );
    }
}
