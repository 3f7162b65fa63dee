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

use std::future::Future;

use stockpile_common::product::ProductId;

/// The external warehouse-of-record.
///
/// Slow and possibly unreliable; the cache calls it sparingly: once per
/// never-seen product to seed a local entry, and on every reconciliation to
/// report the local authoritative value back.
pub trait Warehouse: Send + Sync + 'static {
    /// Authoritative stock for a product the cache has never seen.
    #[must_use]
    fn baseline(&self, product: &ProductId) -> impl Future<Output = anyhow::Result<u64>> + Send;

    /// Best-effort notification of the cache's current authoritative value.
    ///
    /// A failure rolls back nothing on the cache side; the periodic sweep
    /// carries the value again.
    #[must_use]
    fn push(&self, product: &ProductId, stock: u64) -> impl Future<Output = anyhow::Result<()>> + Send;
}
