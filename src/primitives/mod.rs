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

//! Header data model, RLP codec, hardfork identity, and the `ChainParams`
//! collaborator contract. Pure and free of I/O.

pub mod chain_params;
pub mod constants;
pub mod errors;
pub mod hardfork;
pub mod header;

pub use chain_params::{ChainParams, ChainParamsError, StaticChainParams};
pub use errors::{ConsensusError, Field};
pub use hardfork::Hardfork;
pub use header::{Address, BlockHeader, HeaderFields, HeaderOpts};
