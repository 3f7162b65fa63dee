// Copyright 2026 stockpile Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stock store engines for stockpile.
//!
//! A stock store is a durable mapping from product id to quantity on hand.
//! This crate defines the [`StockStore`] contract and ships two engines:
//! [`JournalStore`], backed by an append-only journal file, and
//! [`MemoryStore`], a volatile engine for tests and ephemeral deployments.

mod error;
mod journal;
mod memory;
mod store;

pub use error::{Error, Result};
pub use journal::JournalStore;
pub use memory::MemoryStore;
pub use store::StockStore;
