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

//! The devp2p-style networking layer (spec.md §4.6-§4.9): node identity,
//! UDP discovery, the TCP session multiplexer, and the `P2PServer`
//! orchestrator that ties them to a single peer registry.

#![forbid(unsafe_code)]

pub mod discovery;
pub mod errors;
pub mod identity;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

pub use discovery::{DiscoveryEvent, DiscoveryTable};
pub use errors::NetworkError;
pub use identity::{IdentityError, NodeIdentity};
pub use registry::PeerRegistry;
pub use server::{LifecycleState, P2PServer, ServerConfig, ServerError};
pub use session::{Hello, MuxEvent, SessionHandle, SessionMultiplexer};
pub use types::{Endpoint, ListeningInfo, PeerRecord, Ports, Reason, ServerInfo, ServerSink, ServerState};
