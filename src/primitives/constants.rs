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

//! Well-known constants for header construction and clique extra-data layout.

use ethereum_types::H256;

/// keccak256(RLP([])) — the hash of an empty uncle list.
pub const KECCAK256_RLP_ARRAY: H256 = H256([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// keccak256(RLP("")) — the hash of an empty trie / empty byte string, used
/// as the default transactions/receipts trie root.
pub const KECCAK256_RLP: H256 = H256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Default gas limit used when a field-dict header omits `gasLimit`.
pub const DEFAULT_GAS_LIMIT: u64 = 0xffff_ffff_ffff_ff;

/// Bytes reserved for signer vanity at the front of clique `extraData`.
pub const CLIQUE_EXTRA_VANITY: usize = 32;

/// Bytes reserved for the seal (`r || s || v`) at the end of clique `extraData`.
pub const CLIQUE_EXTRA_SEAL: usize = 65;

/// Length in bytes of a clique signer address entry in the epoch-transition list.
pub const CLIQUE_SIGNER_LEN: usize = 20;

/// ASCII marker required in `extraData` for the ten blocks following the DAO fork.
pub const DAO_EXTRA_DATA: &[u8] = b"dao-hard-fork";

/// Number of blocks (inclusive of the fork block) over which the DAO extra-data
/// gate applies.
pub const DAO_FORK_EXTRA_RANGE: u64 = 10;
