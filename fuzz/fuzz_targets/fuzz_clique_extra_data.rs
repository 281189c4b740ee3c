// Copyright (c) 2026 Chainnode
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use chainnode::consensus::clique::CliqueRules;
use chainnode::primitives::chain_params::{ConsensusAlgorithm, ConsensusConfig, GenesisValues, StaticChainParams};
use chainnode::primitives::header::{BlockHeader, HeaderFields, HeaderOpts};
use ethereum_types::{H256, U256};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    extra_data: Vec<u8>,
    number: u32,
    epoch: u16,
}

fn params(epoch: u64) -> StaticChainParams {
    StaticChainParams::new(
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
    .with_consensus_config(ConsensusConfig { period: 15, epoch: epoch.max(1) })
}

fuzz_target!(|input: Input| {
    let epoch = input.epoch as u64;
    let cp = params(epoch);

    let fields = HeaderFields {
        number: Some(U256::from(input.number)),
        extra_data: Some(input.extra_data),
        ..Default::default()
    };
    // Field-width validation on the fixed fields happens at construction;
    // extraData itself has no fixed width here, so this should never fail.
    let Ok(header) = BlockHeader::from_field_dict(fields, HeaderOpts::default(), &cp) else {
        return;
    };

    // None of these may panic regardless of extraData length or content.
    let _ = CliqueRules::is_epoch_transition(&header, &cp);
    let _ = CliqueRules::extra_vanity(&header, &cp);
    let _ = CliqueRules::extra_seal(&header, &cp);
    let _ = CliqueRules::epoch_transition_signers(&header, &cp);
    let _ = CliqueRules::signature_to_address(&header, &cp);
});
