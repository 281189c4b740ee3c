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

//! `PeerRegistry` (spec.md §4.6): an in-memory map from hex peer-id to
//! `PeerRecord`, mutated only by `P2PServer`'s session-event dispatch loop.
//! No ordering guarantees are offered over `iter()`.

use std::collections::HashMap;

use super::types::PeerRecord;

/// Concurrency-safe mapping from peer-id to live peer record. `P2PServer`
/// is the sole owner; callers never see partial mutation because every
/// access happens from the single dispatch context (spec.md §5).
#[derive(Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerRecord>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self { peers: HashMap::new() }
    }

    /// Inserts `record`, overwriting any prior entry for the same id.
    pub fn insert(&mut self, record: PeerRecord) {
        self.peers.insert(record.id.clone(), record);
    }

    /// Removes and returns the record for `id`, if present. A removal for
    /// an unknown id is a no-op (spec.md §8 invariant 8).
    pub fn remove(&mut self, id: &str) -> Option<PeerRecord> {
        self.peers.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&PeerRecord> {
        self.peers.get(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Unordered iteration over live records.
    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(id: &str) -> PeerRecord {
        PeerRecord {
            id: id.to_string(),
            host: "127.0.0.1".to_string(),
            port: 30303,
            inbound: true,
            protocols: BTreeSet::new(),
        }
    }

    #[test]
    fn insert_overwrites_prior_entry_for_same_id() {
        let mut reg = PeerRegistry::new();
        reg.insert(record("abc"));
        reg.insert(PeerRecord { port: 9999, ..record("abc") });
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("abc").unwrap().port, 9999);
    }

    #[test]
    fn remove_unknown_id_is_a_no_op() {
        let mut reg = PeerRegistry::new();
        assert!(reg.remove("nope").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_returns_prior_record() {
        let mut reg = PeerRegistry::new();
        reg.insert(record("abc"));
        let removed = reg.remove("abc").unwrap();
        assert_eq!(removed.id, "abc");
        assert!(reg.get("abc").is_none());
    }
}
