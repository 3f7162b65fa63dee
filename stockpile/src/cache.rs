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

use std::sync::{atomic::Ordering, Arc};

use stockpile_common::{lock::KeyLocks, product::ProductId};
use stockpile_store::StockStore;
use tokio::{
    sync::{broadcast, mpsc, Mutex as AsyncMutex},
    task::JoinHandle,
};

use crate::{
    error::{Error, Result},
    reconciler,
    statistics::Statistics,
    warehouse::Warehouse,
};

/// Write-through/write-back stock cache between clients and a slow
/// warehouse-of-record.
///
/// Reads are served from the local store, mutations apply under per-product
/// mutual exclusion, and every mutation is reconciled back to the warehouse:
/// best-effort right away through the reconciler queue, authoritatively by
/// the periodic sweep.
///
/// Cloning is cheap and clones share all state.
pub struct StockCache<S, W> {
    inner: Arc<CacheInner<S, W>>,
}

impl<S, W> Clone for StockCache<S, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, W> std::fmt::Debug for StockCache<S, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockCache").finish()
    }
}

struct CacheInner<S, W> {
    store: Arc<S>,

    warehouse: Arc<W>,

    locks: KeyLocks<ProductId>,

    reconcile_tx: mpsc::Sender<ProductId>,

    stop_tx: broadcast::Sender<()>,

    handles: AsyncMutex<Vec<JoinHandle<()>>>,

    statistics: Arc<Statistics>,
}

impl<S, W> Drop for CacheInner<S, W> {
    fn drop(&mut self) {
        // Stop the background tasks if `close` was never called.
        let _ = self.stop_tx.send(());
    }
}

impl<S, W> StockCache<S, W>
where
    S: StockStore,
    W: Warehouse,
{
    pub(crate) fn new(
        store: Arc<S>,
        warehouse: Arc<W>,
        locks: KeyLocks<ProductId>,
        reconcile_tx: mpsc::Sender<ProductId>,
        stop_tx: broadcast::Sender<()>,
        handles: Vec<JoinHandle<()>>,
        statistics: Arc<Statistics>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                warehouse,
                locks,
                reconcile_tx,
                stop_tx,
                handles: AsyncMutex::new(handles),
                statistics,
            }),
        }
    }

    /// Current stock for a product, seeding unseen products from the
    /// warehouse baseline.
    ///
    /// This path takes no lock: a read racing a mutation may observe the
    /// pre-mutation value, and two concurrent first reads of an unseen
    /// product may both fetch the baseline (last write wins). Accepted
    /// looseness in exchange for a contention-free read path; mutations stay
    /// fully serialized per product.
    pub async fn get(&self, product: &ProductId) -> Result<u64> {
        let inner = &self.inner;
        inner.statistics.get.fetch_add(1, Ordering::Relaxed);
        if let Some(stock) = inner.store.get(product).await? {
            inner.statistics.get_hit.fetch_add(1, Ordering::Relaxed);
            return Ok(stock);
        }
        inner.statistics.get_miss.fetch_add(1, Ordering::Relaxed);
        let baseline = inner.warehouse.baseline(product).await.map_err(Error::Warehouse)?;
        inner.store.put(product, baseline).await?;
        Ok(baseline)
    }

    /// Retrieve `amount` units if the product has that much on hand.
    ///
    /// Serialized per product: of two concurrent retrievals that together
    /// exceed the stock, exactly one applies. Returns `false` when stock is
    /// insufficient, a normal business outcome that mutates nothing. An
    /// unseen product is seeded from the warehouse baseline first; the seed
    /// persists even when the retrieval itself is rejected.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is zero.
    pub async fn try_retrieve(&self, product: &ProductId, amount: u64) -> Result<bool> {
        assert!(amount > 0, "retrieve amount must be positive");
        let inner = &self.inner;
        let applied = {
            let _guard = inner.locks.lock(product).await;
            let current = inner.store.get(product).await?;
            let stock = match current {
                Some(stock) => stock,
                None => inner.warehouse.baseline(product).await.map_err(Error::Warehouse)?,
            };
            if stock >= amount {
                inner.store.put(product, stock - amount).await?;
                inner.statistics.retrieve_success.fetch_add(1, Ordering::Relaxed);
                true
            } else {
                if current.is_none() {
                    // The seed is a cache fill; it outlives the rejected
                    // retrieval.
                    inner.store.put(product, stock).await?;
                }
                inner.statistics.retrieve_insufficient.fetch_add(1, Ordering::Relaxed);
                false
            }
        };
        self.trigger_reconcile(product);
        Ok(applied)
    }

    /// Add `amount` units to a product's stock.
    ///
    /// An unseen product is seeded as `baseline + amount` in a single write.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is zero.
    pub async fn add_stock(&self, product: &ProductId, amount: u64) -> Result<()> {
        assert!(amount > 0, "restock amount must be positive");
        let inner = &self.inner;
        {
            let _guard = inner.locks.lock(product).await;
            let stock = match inner.store.get(product).await? {
                Some(stock) => stock,
                None => inner.warehouse.baseline(product).await.map_err(Error::Warehouse)?,
            };
            inner.store.put(product, stock.saturating_add(amount)).await?;
        }
        inner.statistics.restock.fetch_add(1, Ordering::Relaxed);
        self.trigger_reconcile(product);
        Ok(())
    }

    /// Push the locally known stock for `product` to the warehouse now.
    ///
    /// Runs without the product lock; the pushed value may already be stale
    /// relative to a mutation completing concurrently.
    pub async fn reconcile(&self, product: &ProductId) -> Result<()> {
        reconciler::reconcile(
            self.inner.store.as_ref(),
            self.inner.warehouse.as_ref(),
            &self.inner.statistics,
            product,
        )
        .await
    }

    /// Access the underlying stock store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Operation counters of this cache.
    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.inner.statistics
    }

    /// Stop the reconciler and the sweep scheduler and wait for them to exit.
    ///
    /// Queued and in-flight warehouse pushes may be abandoned; local state is
    /// already durable and the warehouse catches up on the next start.
    pub async fn close(&self) {
        let _ = self.inner.stop_tx.send(());
        let mut handles = self.inner.handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("[cache] background task failed to join, error: {e}");
            }
        }
    }

    fn trigger_reconcile(&self, product: &ProductId) {
        if let Err(e) = self.inner.reconcile_tx.try_send(product.clone()) {
            self.inner.statistics.reconcile_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("[cache] reconcile request dropped, product: {product}, cause: {e}");
        }
    }
}
