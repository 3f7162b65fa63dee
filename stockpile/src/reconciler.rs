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

use stockpile_common::product::ProductId;
use stockpile_store::StockStore;
use tokio::sync::{broadcast, mpsc};

use crate::{
    error::{Error, Result},
    statistics::Statistics,
    warehouse::Warehouse,
};

/// Push one product's locally known stock to the warehouse.
///
/// Runs without the product lock, so the pushed value may already be stale
/// relative to a mutation completing concurrently; the next push or sweep
/// carries the newer value. A product the store has never seen is skipped.
pub(crate) async fn reconcile<S, W>(
    store: &S,
    warehouse: &W,
    statistics: &Statistics,
    product: &ProductId,
) -> Result<()>
where
    S: StockStore,
    W: Warehouse,
{
    let Some(stock) = store.get(product).await? else {
        return Ok(());
    };
    warehouse.push(product, stock).await.map_err(Error::Warehouse)?;
    statistics.reconcile.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

/// Dedicated worker draining the per-mutation reconciliation queue.
///
/// Mutations enqueue product ids instead of detaching tasks; this worker
/// makes the pushes observable (logged, counted) and gives shutdown a single
/// task to stop. Push failures are swallowed here and repaired by the sweep.
pub(crate) struct Reconciler<S, W> {
    store: Arc<S>,

    warehouse: Arc<W>,

    entry_rx: mpsc::Receiver<ProductId>,

    statistics: Arc<Statistics>,

    stop_rx: broadcast::Receiver<()>,
}

impl<S, W> Reconciler<S, W>
where
    S: StockStore,
    W: Warehouse,
{
    pub(crate) fn new(
        store: Arc<S>,
        warehouse: Arc<W>,
        entry_rx: mpsc::Receiver<ProductId>,
        statistics: Arc<Statistics>,
        stop_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            store,
            warehouse,
            entry_rx,
            statistics,
            stop_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.stop_rx.recv() => {
                    let mut abandoned = 0;
                    while self.entry_rx.try_recv().is_ok() {
                        abandoned += 1;
                    }
                    tracing::info!("[reconciler] exit, abandoned {abandoned} queued pushes");
                    return;
                }
                entry = self.entry_rx.recv() => {
                    let Some(product) = entry else {
                        tracing::info!("[reconciler] exit");
                        return;
                    };
                    self.handle(product).await;
                }
            }
        }
    }

    async fn handle(&self, product: ProductId) {
        if let Err(e) = reconcile(
            self.store.as_ref(),
            self.warehouse.as_ref(),
            &self.statistics,
            &product,
        )
        .await
        {
            self.statistics.reconcile_failure.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("[reconciler] push failed, product: {product}, error: {e}");
        }
    }
}
