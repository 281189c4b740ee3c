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

//! `TransactionFactory`: a thin classifier over the leading byte of a raw
//! transaction, dispatching to the legacy or EIP-2930 shape. Transaction
//! execution itself is out of scope; this module only identifies what kind
//! of envelope a caller is holding.

use rlp::Rlp;

use crate::primitives::chain_params::ChainParams;
use crate::primitives::errors::ConsensusError;

const EIP_2930_TYPE: u8 = 0x01;
const EIP_2718: u32 = 2718;

/// The identified shape of a decoded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxClass {
    LegacySigned,
    LegacyUnsigned,
    Eip2930Signed,
    Eip2930Unsigned,
}

pub struct TransactionFactory;

impl TransactionFactory {
    /// `decode(rawBytes, opts)`.
    pub fn decode(raw: &[u8], chain_params: &dyn ChainParams) -> Result<TxClass, ConsensusError> {
        let first = *raw.first().ok_or(ConsensusError::MalformedHeader)?;
        if first <= 0x7F {
            if !chain_params.eips().contains(&EIP_2718) {
                return Err(ConsensusError::EIP2718Disabled);
            }
            match first {
                EIP_2930_TYPE => Self::decode_eip2930(&raw[1..]),
                _ => Err(ConsensusError::UnknownTxType),
            }
        } else {
            Self::decode_legacy(raw)
        }
    }

    fn decode_legacy(raw: &[u8]) -> Result<TxClass, ConsensusError> {
        let count = list_item_count(raw)?;
        // nonce, gasPrice, gasLimit, to, value, data [, v, r, s]
        if count >= 9 {
            Ok(TxClass::LegacySigned)
        } else {
            Ok(TxClass::LegacyUnsigned)
        }
    }

    fn decode_eip2930(raw: &[u8]) -> Result<TxClass, ConsensusError> {
        let count = list_item_count(raw)?;
        // chainId, nonce, gasPrice, gasLimit, to, value, data, accessList [, v, r, s]
        if count >= 11 {
            Ok(TxClass::Eip2930Signed)
        } else {
            Ok(TxClass::Eip2930Unsigned)
        }
    }

    /// Mirrors the source's `getTransactionClass(undefined, signed=true)`
    /// path, whose intent is ambiguous: rather than guess a tx type, this
    /// is preserved as an explicit rejection instead of a silent dispatch.
    pub fn get_transaction_class(
        tx_type: Option<u8>,
        signed: bool,
        raw: &[u8],
        chain_params: &dyn ChainParams,
    ) -> Result<TxClass, ConsensusError> {
        match tx_type {
            None if signed => Err(ConsensusError::UnsupportedRequest),
            _ => Self::decode(raw, chain_params),
        }
    }
}

fn list_item_count(raw: &[u8]) -> Result<usize, ConsensusError> {
    let rlp = Rlp::new(raw);
    if !rlp.is_list() {
        return Err(ConsensusError::MalformedHeader);
    }
    rlp.item_count().map_err(|_| ConsensusError::MalformedHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::chain_params::{ConsensusAlgorithm, GenesisValues, StaticChainParams};
    use ethereum_types::{H256, U256};

    fn params_with_eips(eips: &[u32]) -> StaticChainParams {
        let mut cp = StaticChainParams::new(
            ConsensusAlgorithm::Ethash,
            GenesisValues {
                gas_limit: U256::from(5000u64),
                timestamp: U256::zero(),
                difficulty: U256::zero(),
                extra_data: Vec::new(),
                nonce: [0u8; 8],
                state_root: H256::zero(),
            },
        );
        for eip in eips {
            cp = cp.with_eip(*eip);
        }
        cp
    }

    #[test]
    fn legacy_envelope_dispatches_by_field_count() {
        let cp = params_with_eips(&[]);
        let mut s = rlp::RlpStream::new_list(6);
        for _ in 0..6 {
            s.append_empty_data();
        }
        let raw = s.out().to_vec();
        assert_eq!(
            TransactionFactory::decode(&raw, &cp).unwrap(),
            TxClass::LegacyUnsigned
        );
    }

    #[test]
    fn typed_envelope_requires_eip_2718() {
        let cp = params_with_eips(&[]);
        let raw = vec![0x01, 0xc0];
        assert_eq!(
            TransactionFactory::decode(&raw, &cp).unwrap_err(),
            ConsensusError::EIP2718Disabled
        );
    }

    #[test]
    fn unknown_typed_envelope_is_rejected() {
        let cp = params_with_eips(&[2718]);
        let raw = vec![0x02, 0xc0];
        assert_eq!(
            TransactionFactory::decode(&raw, &cp).unwrap_err(),
            ConsensusError::UnknownTxType
        );
    }

    #[test]
    fn ambiguous_class_request_is_unsupported() {
        let cp = params_with_eips(&[2718]);
        let err =
            TransactionFactory::get_transaction_class(None, true, &[0xc0], &cp).unwrap_err();
        assert_eq!(err, ConsensusError::UnsupportedRequest);
    }
}
