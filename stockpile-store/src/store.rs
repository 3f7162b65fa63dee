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

use crate::error::Result;

/// The durable mapping from product id to quantity on hand.
///
/// A store guarantees that a single [`StockStore::put`] is durably visible to
/// subsequent [`StockStore::get`] and [`StockStore::list`] calls once it
/// returns. Cross-operation atomicity is the caller's responsibility.
pub trait StockStore: Send + Sync + 'static {
    /// Get the locally known stock for a product.
    ///
    /// Returns `None` for a product that was never seeded.
    #[must_use]
    fn get(&self, product: &ProductId) -> impl Future<Output = Result<Option<u64>>> + Send;

    /// Insert or overwrite the stock for a product.
    #[must_use]
    fn put(&self, product: &ProductId, stock: u64) -> impl Future<Output = Result<()>> + Send;

    /// Enumerate every product known to the store.
    #[must_use]
    fn list(&self) -> impl Future<Output = Result<Vec<(ProductId, u64)>>> + Send;
}
