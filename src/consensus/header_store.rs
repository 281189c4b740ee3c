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

//! The blockchain-store collaborator: only the lookup contract
//! `HeaderValidator` needs, nothing about persistence or storage engine.

use ethereum_types::H256;

use crate::primitives::header::BlockHeader;

/// Looks up a previously-accepted header by its hash.
pub trait HeaderStore: Send + Sync {
    fn header(&self, parent_hash: H256) -> Option<BlockHeader>;
}
