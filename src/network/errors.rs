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

//! Transport-level error classification (spec.md §7): a fixed, data-driven
//! list of substrings that mark a transport error as safe to ignore rather
//! than surface to an operator or peer-record error sink.

use thiserror::Error;

/// A fault raised while constructing or running the discovery table or
/// session multiplexer. Distinct from `ConsensusError`: these never
/// invalidate the server's lifecycle, only a single operation.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to bind {proto} socket on {addr}: {source}")]
    Bind {
        proto: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed discovery packet")]
    MalformedPacket,
    #[error("malformed session frame")]
    MalformedFrame,
    #[error("cryptographic handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("remote client id rejected by allow-list")]
    ClientFiltered,
    #[error("max peers reached")]
    MaxPeersReached,
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Substrings that mark a transport error as routine noise (peer hung up,
/// dropped packet, timed out) rather than a condition worth surfacing.
/// Constructed once as data, never recompiled per error (§9 Design Notes).
const IGNORED_ERROR_SUBSTRINGS: &[&str] = &[
    "EPIPE",
    "ECONNRESET",
    "ETIMEDOUT",
    "NetworkId mismatch",
    "Timeout error: ping",
    "Genesis block mismatch",
    "Handshake timed out",
    "Invalid address buffer",
    "Invalid MAC",
    "Invalid timestamp buffer",
    "Hash verification failed",
];

/// Whether routing `message` through the server's error sink should be
/// suppressed. `true` means the error is routine transport noise.
pub fn is_ignored(message: &str) -> bool {
    IGNORED_ERROR_SUBSTRINGS
        .iter()
        .any(|pattern| message.contains(pattern))
}
