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

//! `BlockHeader` and `HeaderCodec`: the canonical 15-field RLP header, its
//! field-dictionary and RLP constructors, and the clique-aware hash.

use ethereum_types::{Bloom, H160, H256, H64, U256};
use rlp::{Encodable, Rlp, RlpStream};

use super::chain_params::{ChainParams, ConsensusAlgorithm};
use super::constants::{
    CLIQUE_EXTRA_SEAL, DAO_EXTRA_DATA, DAO_FORK_EXTRA_RANGE, DEFAULT_GAS_LIMIT, KECCAK256_RLP,
    KECCAK256_RLP_ARRAY,
};
use super::errors::{ConsensusError, Field};
use super::hardfork::Hardfork;

pub type Address = H160;

/// Options controlling header construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderOpts {
    /// Explicit hardfork context; when absent, resolved from `ChainParams`
    /// at the header's (post-coercion) number.
    pub hardfork: Option<Hardfork>,
    /// Coerce `number` to zero and substitute canonical-zero fields with
    /// the chain's genesis values.
    pub init_with_genesis_header: bool,
}

/// Field-dictionary form consumed by [`HeaderCodec::from_field_dict`]. Every
/// field is optional; absent fields take the canonical-zero default
/// spec.md §4.1 names.
#[derive(Clone, Debug, Default)]
pub struct HeaderFields {
    pub parent_hash: Option<H256>,
    pub uncle_hash: Option<H256>,
    pub coinbase: Option<Address>,
    pub state_root: Option<H256>,
    pub transactions_trie: Option<H256>,
    pub receipt_trie: Option<H256>,
    pub bloom: Option<Bloom>,
    pub difficulty: Option<U256>,
    pub number: Option<U256>,
    pub gas_limit: Option<U256>,
    pub gas_used: Option<U256>,
    pub timestamp: Option<U256>,
    pub extra_data: Option<Vec<u8>>,
    pub mix_hash: Option<H256>,
    pub nonce: Option<[u8; 8]>,
}

/// An immutable, validated-at-construction block header.
///
/// Once built, no field is mutable; the only way to obtain a `BlockHeader`
/// with different contents is to build a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    parent_hash: H256,
    uncle_hash: H256,
    coinbase: Address,
    state_root: H256,
    transactions_trie: H256,
    receipt_trie: H256,
    bloom: Bloom,
    difficulty: U256,
    number: U256,
    gas_limit: U256,
    gas_used: U256,
    timestamp: U256,
    extra_data: Vec<u8>,
    mix_hash: H256,
    nonce: [u8; 8],
}

impl BlockHeader {
    pub fn parent_hash(&self) -> H256 {
        self.parent_hash
    }
    pub fn uncle_hash(&self) -> H256 {
        self.uncle_hash
    }
    pub fn coinbase(&self) -> Address {
        self.coinbase
    }
    pub fn state_root(&self) -> H256 {
        self.state_root
    }
    pub fn transactions_trie(&self) -> H256 {
        self.transactions_trie
    }
    pub fn receipt_trie(&self) -> H256 {
        self.receipt_trie
    }
    pub fn bloom(&self) -> Bloom {
        self.bloom
    }
    pub fn difficulty(&self) -> U256 {
        self.difficulty
    }
    pub fn number(&self) -> U256 {
        self.number
    }
    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }
    pub fn gas_used(&self) -> U256 {
        self.gas_used
    }
    pub fn timestamp(&self) -> U256 {
        self.timestamp
    }
    pub fn extra_data(&self) -> &[u8] {
        &self.extra_data
    }
    pub fn mix_hash(&self) -> H256 {
        self.mix_hash
    }
    pub fn nonce(&self) -> [u8; 8] {
        self.nonce
    }

    pub fn is_genesis(&self) -> bool {
        self.number.is_zero()
    }

    /// The resolved hardfork in effect for this header, per `opts.hardfork`
    /// or `chain_params.active_hardfork_at(number)`.
    pub fn resolved_hardfork(
        &self,
        opts_hardfork: Option<Hardfork>,
        chain_params: &dyn ChainParams,
    ) -> Hardfork {
        opts_hardfork.unwrap_or_else(|| chain_params.active_hardfork_at(self.number))
    }

    /// `rawSequence()` — the 15-element positional RLP encoding, numeric
    /// fields minimal big-endian (zero encodes as empty bytes, which is
    /// exactly what `rlp`'s `Encodable` for `U256` already produces).
    pub fn raw_sequence(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    /// keccak256 of the RLP-encoded raw sequence, with the clique
    /// extraData-truncation exception: on a non-genesis clique header,
    /// element 12 is truncated to drop the trailing seal before hashing.
    pub fn hash(&self, chain_params: &dyn ChainParams) -> H256 {
        let is_clique = matches!(chain_params.consensus_algorithm(), ConsensusAlgorithm::Clique);
        if is_clique && !self.is_genesis() {
            let truncated_len = self.extra_data.len().saturating_sub(CLIQUE_EXTRA_SEAL);
            let mut truncated = self.clone();
            truncated.extra_data.truncate(truncated_len);
            keccak_hash::keccak(rlp::encode(&truncated).as_ref())
        } else {
            keccak_hash::keccak(rlp::encode(self).as_ref())
        }
    }

    /// `fromFieldDict(data, opts)`.
    pub fn from_field_dict(
        fields: HeaderFields,
        opts: HeaderOpts,
        chain_params: &dyn ChainParams,
    ) -> Result<Self, ConsensusError> {
        let header = BlockHeader {
            parent_hash: fields.parent_hash.unwrap_or_else(H256::zero),
            uncle_hash: fields.uncle_hash.unwrap_or(KECCAK256_RLP_ARRAY),
            coinbase: fields.coinbase.unwrap_or_else(Address::zero),
            state_root: fields.state_root.unwrap_or_else(H256::zero),
            transactions_trie: fields.transactions_trie.unwrap_or(KECCAK256_RLP),
            receipt_trie: fields.receipt_trie.unwrap_or(KECCAK256_RLP),
            bloom: fields.bloom.unwrap_or_else(Bloom::zero),
            difficulty: fields.difficulty.unwrap_or_else(U256::zero),
            number: fields.number.unwrap_or_else(U256::zero),
            gas_limit: fields.gas_limit.unwrap_or_else(|| U256::from(DEFAULT_GAS_LIMIT)),
            gas_used: fields.gas_used.unwrap_or_else(U256::zero),
            timestamp: fields.timestamp.unwrap_or_else(U256::zero),
            extra_data: fields.extra_data.unwrap_or_default(),
            mix_hash: fields.mix_hash.unwrap_or_else(H256::zero),
            nonce: fields.nonce.unwrap_or([0u8; 8]),
        };
        header.finish(opts, chain_params)
    }

    /// `fromRlpBytes(bytes, opts)`.
    pub fn from_rlp_bytes(
        bytes: &[u8],
        opts: HeaderOpts,
        chain_params: &dyn ChainParams,
    ) -> Result<Self, ConsensusError> {
        let rlp = Rlp::new(bytes);
        if !rlp.is_list() {
            return Err(ConsensusError::MalformedHeader);
        }
        let count = rlp.item_count().map_err(|_| ConsensusError::MalformedHeader)?;
        if count > 15 {
            return Err(ConsensusError::MalformedHeader);
        }
        let mut values: Vec<Vec<u8>> = Vec::with_capacity(count);
        for i in 0..count {
            let item = rlp.at(i).map_err(|_| ConsensusError::MalformedHeader)?;
            let data = item.data().map_err(|_| ConsensusError::MalformedHeader)?;
            values.push(data.to_vec());
        }
        Self::from_values_sequence(&values, opts, chain_params)
    }

    /// `fromValuesSequence(values, opts)` — positional decode of up to 15
    /// raw byte-string elements; a value absent from a short sequence is
    /// treated as empty bytes (zero for numeric fields).
    pub fn from_values_sequence(
        values: &[Vec<u8>],
        opts: HeaderOpts,
        chain_params: &dyn ChainParams,
    ) -> Result<Self, ConsensusError> {
        if values.len() > 15 {
            return Err(ConsensusError::MalformedHeader);
        }
        let at = |i: usize| -> &[u8] { values.get(i).map(Vec::as_slice).unwrap_or(&[]) };

        let parent_hash = fixed_h256(at(0), Field::ParentHash)?;
        let uncle_hash = fixed_h256(at(1), Field::UncleHash)?;
        let coinbase = fixed_address(at(2))?;
        let state_root = fixed_h256(at(3), Field::StateRoot)?;
        let transactions_trie = fixed_h256(at(4), Field::TransactionsTrie)?;
        let receipt_trie = fixed_h256(at(5), Field::ReceiptTrie)?;
        let bloom = fixed_bloom(at(6))?;
        let difficulty = numeric(at(7))?;
        let number = numeric(at(8))?;
        let gas_limit = numeric(at(9))?;
        let gas_used = numeric(at(10))?;
        let timestamp = numeric(at(11))?;
        let extra_data = at(12).to_vec();
        let mix_hash = fixed_h256(at(13), Field::MixHash)?;
        let nonce = fixed_nonce(at(14))?;

        let header = BlockHeader {
            parent_hash,
            uncle_hash,
            coinbase,
            state_root,
            transactions_trie,
            receipt_trie,
            bloom,
            difficulty,
            number,
            gas_limit,
            gas_used,
            timestamp,
            extra_data,
            mix_hash,
            nonce,
        };
        header.finish(opts, chain_params)
    }

    /// Applies the DAO extraData gate and the genesis-option substitution,
    /// shared by all three constructors.
    fn finish(
        mut self,
        opts: HeaderOpts,
        chain_params: &dyn ChainParams,
    ) -> Result<Self, ConsensusError> {
        if opts.init_with_genesis_header {
            let ctx = opts
                .hardfork
                .unwrap_or_else(|| chain_params.active_hardfork_at(U256::zero()));
            if ctx != Hardfork::Chainstart {
                return Err(ConsensusError::InvalidGenesisOption);
            }
            self.number = U256::zero();
            let genesis = chain_params.genesis();
            if self.gas_limit == U256::from(DEFAULT_GAS_LIMIT) {
                self.gas_limit = genesis.gas_limit;
            }
            if self.timestamp.is_zero() {
                self.timestamp = genesis.timestamp;
            }
            if self.difficulty.is_zero() {
                self.difficulty = genesis.difficulty;
            }
            if self.extra_data.is_empty() {
                self.extra_data = genesis.extra_data;
            }
            if self.nonce == [0u8; 8] {
                self.nonce = genesis.nonce;
            }
            if self.state_root.is_zero() {
                self.state_root = genesis.state_root;
            }
        }

        self.check_dao_gate(chain_params)?;
        Ok(self)
    }

    fn check_dao_gate(&self, chain_params: &dyn ChainParams) -> Result<(), ConsensusError> {
        if !chain_params.is_hardfork_active(Hardfork::Dao) {
            return Ok(());
        }
        let Some(dao_block) = chain_params.hardfork_block(Hardfork::Dao) else {
            return Ok(());
        };
        if self.number < dao_block {
            return Ok(());
        }
        let distance = self.number - dao_block;
        if distance <= U256::from(DAO_FORK_EXTRA_RANGE - 1) && self.extra_data != DAO_EXTRA_DATA {
            return Err(ConsensusError::InvalidDAOExtraData);
        }
        Ok(())
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(15);
        s.append(&self.parent_hash);
        s.append(&self.uncle_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_trie);
        s.append(&self.receipt_trie);
        s.append(&self.bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
        s.append(&self.mix_hash);
        s.append(&self.nonce.to_vec());
    }
}

fn numeric(bytes: &[u8]) -> Result<U256, ConsensusError> {
    if bytes.len() > 32 {
        return Err(ConsensusError::MalformedHeader);
    }
    Ok(U256::from_big_endian(bytes))
}

fn fixed_h256(bytes: &[u8], field: Field) -> Result<H256, ConsensusError> {
    if bytes.len() != 32 {
        return Err(ConsensusError::InvalidFieldWidth(field));
    }
    Ok(H256::from_slice(bytes))
}

fn fixed_address(bytes: &[u8]) -> Result<Address, ConsensusError> {
    if bytes.len() != 20 {
        return Err(ConsensusError::InvalidFieldWidth(Field::Coinbase));
    }
    Ok(Address::from_slice(bytes))
}

fn fixed_bloom(bytes: &[u8]) -> Result<Bloom, ConsensusError> {
    if bytes.len() != 256 {
        return Err(ConsensusError::InvalidFieldWidth(Field::Bloom));
    }
    Ok(Bloom::from_slice(bytes))
}

fn fixed_nonce(bytes: &[u8]) -> Result<[u8; 8], ConsensusError> {
    if bytes.len() != 8 {
        return Err(ConsensusError::InvalidFieldWidth(Field::Nonce));
    }
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    Ok(out)
}
