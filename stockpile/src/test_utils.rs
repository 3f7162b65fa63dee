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

//! Test utilities for exercising a cache against scripted collaborators.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use stockpile_common::product::ProductId;

use crate::warehouse::Warehouse;

/// Scripted in-memory warehouse-of-record.
///
/// Clones share state, so a test can keep one handle while the cache owns
/// another. Unscripted products report a baseline of zero.
#[derive(Debug, Clone, Default)]
pub struct MockWarehouse {
    inner: Arc<MockWarehouseInner>,
}

#[derive(Debug, Default)]
struct MockWarehouseInner {
    baselines: Mutex<HashMap<ProductId, u64>>,
    pushed: Mutex<HashMap<ProductId, u64>>,
    baseline_calls: AtomicUsize,
    push_calls: AtomicUsize,
    baseline_delay: Mutex<Option<Duration>>,
    fail_baselines: AtomicBool,
    fail_pushes: AtomicBool,
}

impl MockWarehouse {
    /// Create a warehouse with no scripted baselines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the authoritative baseline for a product.
    pub fn set_baseline(&self, product: &ProductId, stock: u64) {
        self.inner.baselines.lock().insert(product.clone(), stock);
    }

    /// Delay every baseline read, simulating a slow warehouse.
    pub fn set_baseline_delay(&self, delay: Duration) {
        *self.inner.baseline_delay.lock() = Some(delay);
    }

    /// Make subsequent baseline reads fail.
    pub fn fail_baselines(&self, fail: bool) {
        self.inner.fail_baselines.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent pushes fail and go unrecorded.
    pub fn fail_pushes(&self, fail: bool) {
        self.inner.fail_pushes.store(fail, Ordering::Relaxed);
    }

    /// Number of baseline reads received, failed ones included.
    pub fn baseline_calls(&self) -> usize {
        self.inner.baseline_calls.load(Ordering::Relaxed)
    }

    /// Number of pushes received, failed ones included.
    pub fn push_calls(&self) -> usize {
        self.inner.push_calls.load(Ordering::Relaxed)
    }

    /// Last stock value successfully pushed for a product.
    pub fn pushed(&self, product: &ProductId) -> Option<u64> {
        self.inner.pushed.lock().get(product).copied()
    }
}

impl Warehouse for MockWarehouse {
    async fn baseline(&self, product: &ProductId) -> anyhow::Result<u64> {
        self.inner.baseline_calls.fetch_add(1, Ordering::Relaxed);
        let delay = *self.inner.baseline_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail_baselines.load(Ordering::Relaxed) {
            anyhow::bail!("warehouse offline");
        }
        Ok(self.inner.baselines.lock().get(product).copied().unwrap_or(0))
    }

    async fn push(&self, product: &ProductId, stock: u64) -> anyhow::Result<()> {
        self.inner.push_calls.fetch_add(1, Ordering::Relaxed);
        if self.inner.fail_pushes.load(Ordering::Relaxed) {
            anyhow::bail!("warehouse offline");
        }
        self.inner.pushed.lock().insert(product.clone(), stock);
        Ok(())
    }
}
