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

use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use stockpile_store::StockStore;
use tokio::sync::broadcast;

use crate::{reconciler::reconcile, statistics::Statistics, warehouse::Warehouse};

/// Periodic full-table sweep pushing every known product to the warehouse.
///
/// Redundant with the per-mutation pushes on purpose: any push lost to a
/// warehouse hiccup or a full queue is carried again on the next tick. The
/// first tick fires immediately at startup.
pub(crate) struct SyncScheduler<S, W> {
    store: Arc<S>,

    warehouse: Arc<W>,

    period: Duration,

    statistics: Arc<Statistics>,

    stop_rx: broadcast::Receiver<()>,
}

impl<S, W> SyncScheduler<S, W>
where
    S: StockStore,
    W: Warehouse,
{
    pub(crate) fn new(
        store: Arc<S>,
        warehouse: Arc<W>,
        period: Duration,
        statistics: Arc<Statistics>,
        stop_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            store,
            warehouse,
            period,
            statistics,
            stop_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            tokio::select! {
                biased;
                _ = self.stop_rx.recv() => {
                    tracing::info!("[scheduler] exit");
                    return;
                }
                _ = interval.tick() => self.sweep().await,
            }
        }
    }

    async fn sweep(&self) {
        let entries = match self.store.list().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("[scheduler] sweep skipped, store error: {e}");
                return;
            }
        };
        // Entries are independent; sequential pushes keep warehouse pressure
        // bounded.
        for (product, _) in entries {
            if let Err(e) = reconcile(
                self.store.as_ref(),
                self.warehouse.as_ref(),
                &self.statistics,
                &product,
            )
            .await
            {
                self.statistics.reconcile_failure.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("[scheduler] push failed, product: {product}, error: {e}");
            }
        }
        self.statistics.sweep.fetch_add(1, Ordering::Relaxed);
    }
}
