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

//! Hardfork identity as a ranked enum, so `isHardforkGte` becomes a table
//! lookup (`rank(a) >= rank(b)`) instead of a chain of string comparisons.

use std::fmt;

/// A named protocol upgrade, ordered by activation epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hardfork {
    Chainstart,
    Homestead,
    Dao,
    Byzantium,
    Constantinople,
    MuirGlacier,
    // Anything at or beyond this rank is treated as >= the named fork it
    // shares a rank with for difficulty-branch purposes; chains that stop
    // forking here still resolve correctly.
    London,
}

impl Hardfork {
    /// Monotonic rank used for `>=` comparisons between forks.
    pub fn rank(self) -> u32 {
        match self {
            Hardfork::Chainstart => 0,
            Hardfork::Homestead => 1,
            Hardfork::Dao => 2,
            Hardfork::Byzantium => 3,
            Hardfork::Constantinople => 4,
            Hardfork::MuirGlacier => 5,
            Hardfork::London => 6,
        }
    }

    /// `self >= other` by rank.
    pub fn is_gte(self, other: Hardfork) -> bool {
        self.rank() >= other.rank()
    }

    /// Canonical lowercase name, as used in `ChainParams` lookups.
    pub fn name(self) -> &'static str {
        match self {
            Hardfork::Chainstart => "chainstart",
            Hardfork::Homestead => "homestead",
            Hardfork::Dao => "dao",
            Hardfork::Byzantium => "byzantium",
            Hardfork::Constantinople => "constantinople",
            Hardfork::MuirGlacier => "muirGlacier",
            Hardfork::London => "london",
        }
    }

    /// Parse a `ChainParams`-style hardfork name.
    pub fn from_name(name: &str) -> Option<Hardfork> {
        Some(match name {
            "chainstart" | "frontier" => Hardfork::Chainstart,
            "homestead" => Hardfork::Homestead,
            "dao" => Hardfork::Dao,
            "byzantium" => Hardfork::Byzantium,
            "constantinople" | "petersburg" => Hardfork::Constantinople,
            "muirGlacier" | "muir_glacier" => Hardfork::MuirGlacier,
            "london" => Hardfork::London,
            _ => return None,
        })
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_monotonic_with_chain_order() {
        assert!(Hardfork::Byzantium.is_gte(Hardfork::Homestead));
        assert!(!Hardfork::Homestead.is_gte(Hardfork::Byzantium));
        assert!(Hardfork::Chainstart.is_gte(Hardfork::Chainstart));
    }

    #[test]
    fn name_roundtrips() {
        for hf in [
            Hardfork::Chainstart,
            Hardfork::Homestead,
            Hardfork::Dao,
            Hardfork::Byzantium,
            Hardfork::Constantinople,
            Hardfork::MuirGlacier,
            Hardfork::London,
        ] {
            assert_eq!(Hardfork::from_name(hf.name()), Some(hf));
        }
    }
}
