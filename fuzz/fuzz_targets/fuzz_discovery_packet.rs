// Copyright (c) 2026 Chainnode
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use chainnode::network::discovery::decode_packet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The hash check and ECDSA recovery must reject malformed wire bytes
    // without panicking; never trust attacker-controlled lengths.
    let _ = decode_packet(data);
});
