// Copyright (c) 2026 Chainnode
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use chainnode::primitives::chain_params::{ConsensusAlgorithm, GenesisValues, StaticChainParams};
use chainnode::primitives::header::{BlockHeader, HeaderOpts};
use ethereum_types::{H256, U256};
use libfuzzer_sys::fuzz_target;

fn params() -> StaticChainParams {
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
}

fuzz_target!(|data: &[u8]| {
    let cp = params();
    // Decoding arbitrary bytes must never panic; only fail with a
    // `ConsensusError` or succeed, never both.
    let _ = BlockHeader::from_rlp_bytes(data, HeaderOpts::default(), &cp);
});
