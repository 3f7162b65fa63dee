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

use std::{sync::Arc, time::Duration};

use stockpile_common::{lock::KeyLocks, product::ProductId};
use stockpile_store::StockStore;
use tokio::sync::{broadcast, mpsc};

use crate::{
    cache::StockCache, reconciler::Reconciler, scheduler::SyncScheduler, statistics::Statistics,
    warehouse::Warehouse,
};

/// Default period of the warehouse catch-up sweep.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(9);

/// Default capacity of the per-mutation reconciliation queue.
pub const DEFAULT_RECONCILE_QUEUE_CAPACITY: usize = 4096;

/// Default shard count of the per-product lock manager.
pub const DEFAULT_LOCK_SHARDS: usize = 64;

/// Builder for [`StockCache`].
#[derive(Debug)]
pub struct StockCacheBuilder {
    sync_interval: Duration,
    reconcile_queue_capacity: usize,
    lock_shards: usize,
}

impl Default for StockCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StockCacheBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            sync_interval: DEFAULT_SYNC_INTERVAL,
            reconcile_queue_capacity: DEFAULT_RECONCILE_QUEUE_CAPACITY,
            lock_shards: DEFAULT_LOCK_SHARDS,
        }
    }

    /// Set the period of the warehouse catch-up sweep.
    ///
    /// The first sweep fires immediately at startup.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Set the capacity of the per-mutation reconciliation queue.
    ///
    /// Requests beyond the capacity are dropped and repaired by the next
    /// sweep.
    pub fn with_reconcile_queue_capacity(mut self, capacity: usize) -> Self {
        self.reconcile_queue_capacity = capacity;
        self
    }

    /// Set the shard count of the per-product lock manager.
    pub fn with_lock_shards(mut self, shards: usize) -> Self {
        self.lock_shards = shards;
        self
    }

    /// Set the stock store the cache reads and writes through.
    pub fn store<S>(self, store: S) -> StockCacheBuilderPhaseStore<S>
    where
        S: StockStore,
    {
        StockCacheBuilderPhaseStore {
            builder: self,
            store,
        }
    }
}

/// Builder phase with the stock store chosen.
pub struct StockCacheBuilderPhaseStore<S> {
    builder: StockCacheBuilder,
    store: S,
}

impl<S> StockCacheBuilderPhaseStore<S>
where
    S: StockStore,
{
    /// Set the warehouse-of-record collaborator.
    pub fn warehouse<W>(self, warehouse: W) -> StockCacheBuilderPhaseWarehouse<S, W>
    where
        W: Warehouse,
    {
        StockCacheBuilderPhaseWarehouse {
            builder: self.builder,
            store: self.store,
            warehouse,
        }
    }
}

/// Builder phase ready to build.
pub struct StockCacheBuilderPhaseWarehouse<S, W> {
    builder: StockCacheBuilder,
    store: S,
    warehouse: W,
}

impl<S, W> StockCacheBuilderPhaseWarehouse<S, W>
where
    S: StockStore,
    W: Warehouse,
{
    /// Build the cache and start its background reconciler and sweep
    /// scheduler.
    pub async fn build(self) -> StockCache<S, W> {
        let store = Arc::new(self.store);
        let warehouse = Arc::new(self.warehouse);
        let statistics = Arc::new(Statistics::default());

        let (reconcile_tx, reconcile_rx) =
            mpsc::channel::<ProductId>(self.builder.reconcile_queue_capacity);
        let (stop_tx, _) = broadcast::channel(1);

        let reconciler = Reconciler::new(
            Arc::clone(&store),
            Arc::clone(&warehouse),
            reconcile_rx,
            Arc::clone(&statistics),
            stop_tx.subscribe(),
        );
        let scheduler = SyncScheduler::new(
            Arc::clone(&store),
            Arc::clone(&warehouse),
            self.builder.sync_interval,
            Arc::clone(&statistics),
            stop_tx.subscribe(),
        );
        let handles = vec![tokio::spawn(reconciler.run()), tokio::spawn(scheduler.run())];

        StockCache::new(
            store,
            warehouse,
            KeyLocks::new(self.builder.lock_shards),
            reconcile_tx,
            stop_tx,
            handles,
            statistics,
        )
    }
}
