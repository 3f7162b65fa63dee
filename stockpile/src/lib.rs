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

//! stockpile - write-through stock cache for Rust.
//!
//! stockpile sits between clients and a slow, rate-limited warehouse-of-record
//! and keeps a locally durable copy of each product's stock quantity. Reads
//! are served from the local copy, mutations apply under per-product mutual
//! exclusion, and local values flow back to the warehouse asynchronously:
//! best-effort after every mutation, authoritatively on a periodic sweep.
//!
//! # Example
//!
//! ```
//! use stockpile::{prelude::*, test_utils::MockWarehouse};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let warehouse = MockWarehouse::new();
//! let cache = StockCacheBuilder::new()
//!     .store(MemoryStore::new())
//!     .warehouse(warehouse.clone())
//!     .build()
//!     .await;
//!
//! let product = ProductId::new("sku-1");
//! cache.add_stock(&product, 5).await.unwrap();
//! assert!(cache.try_retrieve(&product, 3).await.unwrap());
//! assert!(!cache.try_retrieve(&product, 3).await.unwrap());
//! assert_eq!(cache.get(&product).await.unwrap(), 2);
//! # cache.close().await;
//! # }
//! ```

mod builder;
mod cache;
mod error;
mod reconciler;
mod scheduler;
mod statistics;
mod warehouse;

pub mod prelude;
pub mod test_utils;

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
