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

//! Re-exports of the public interfaces.

pub use stockpile_common::{
    lock::{KeyGuard, KeyLocks},
    product::ProductId,
};
pub use stockpile_store::{JournalStore, MemoryStore, StockStore};

pub use crate::{
    builder::{
        StockCacheBuilder, StockCacheBuilderPhaseStore, StockCacheBuilderPhaseWarehouse,
        DEFAULT_LOCK_SHARDS, DEFAULT_RECONCILE_QUEUE_CAPACITY, DEFAULT_SYNC_INTERVAL,
    },
    cache::StockCache,
    error::{Error, Result},
    statistics::Statistics,
    warehouse::Warehouse,
};
