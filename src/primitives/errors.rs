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

//! The consensus-core error kinds, gathered into one enum: header
//! construction, validation, difficulty, clique, and transaction dispatch
//! all raise `ConsensusError` rather than carrying a leaf enum each. The
//! kinds themselves are fixed; nothing here is invented beyond them.

/// A fixed-width header field, named for `InvalidFieldWidth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ParentHash,
    UncleHash,
    Coinbase,
    StateRoot,
    TransactionsTrie,
    ReceiptTrie,
    Bloom,
    MixHash,
    Nonce,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Field::ParentHash => "parentHash",
            Field::UncleHash => "uncleHash",
            Field::Coinbase => "coinbase",
            Field::StateRoot => "stateRoot",
            Field::TransactionsTrie => "transactionsTrie",
            Field::ReceiptTrie => "receiptTrie",
            Field::Bloom => "bloom",
            Field::MixHash => "mixHash",
            Field::Nonce => "nonce",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("malformed header")]
    MalformedHeader,
    #[error("invalid width for field {0}")]
    InvalidFieldWidth(Field),
    #[error("invalid genesis option")]
    InvalidGenesisOption,
    #[error("missing parent header")]
    MissingParent,
    #[error("invalid block number")]
    InvalidNumber,
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("invalid clique period")]
    InvalidCliquePeriod,
    #[error("invalid clique extraData")]
    InvalidCliqueExtraData,
    #[error("invalid clique coinbase")]
    InvalidCliqueCoinbase,
    #[error("invalid clique mixHash")]
    InvalidCliqueMixHash,
    #[error("invalid difficulty")]
    InvalidDifficulty,
    #[error("invalid gas limit")]
    InvalidGasLimit,
    #[error("invalid uncle distance")]
    InvalidUncleDistance,
    #[error("invalid DAO extraData")]
    InvalidDAOExtraData,
    #[error("not a clique chain")]
    NotClique,
    #[error("not an epoch transition block")]
    NotEpochTransition,
    #[error("consensus algorithm does not support this operation")]
    UnsupportedConsensus,
    #[error("EIP-2718 is not active on this chain")]
    EIP2718Disabled,
    #[error("unknown transaction type")]
    UnknownTxType,
    #[error("transaction class request is ambiguous and not supported")]
    UnsupportedRequest,

    #[error(transparent)]
    ChainParams(#[from] super::chain_params::ChainParamsError),
}
