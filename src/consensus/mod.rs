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

//! Header consensus core: difficulty, clique rules, and the validator that
//! composes them against a parent header.

pub mod clique;
pub mod difficulty;
pub mod header_store;
pub mod validator;

pub use clique::CliqueRules;
pub use difficulty::DifficultyEngine;
pub use header_store::HeaderStore;
pub use validator::HeaderValidator;
