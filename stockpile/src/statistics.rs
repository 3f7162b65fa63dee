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

//! Internal operation counters, cheap enough to bump on every call and
//! accurate enough for tests and operators to reason about cache behavior.

use std::sync::atomic::AtomicUsize;

/// Operation counters of one cache instance.
#[derive(Debug, Default)]
pub struct Statistics {
    /// Reads served, hit or miss.
    pub get: AtomicUsize,
    /// Reads answered from the local store.
    pub get_hit: AtomicUsize,
    /// Reads that seeded from the warehouse baseline.
    pub get_miss: AtomicUsize,
    /// Retrievals applied.
    pub retrieve_success: AtomicUsize,
    /// Retrievals rejected for insufficient stock.
    pub retrieve_insufficient: AtomicUsize,
    /// Restocks applied.
    pub restock: AtomicUsize,
    /// Stock values pushed to the warehouse.
    pub reconcile: AtomicUsize,
    /// Warehouse pushes that failed and were left to the next sweep.
    pub reconcile_failure: AtomicUsize,
    /// Reconciliation requests dropped on a full queue.
    pub reconcile_dropped: AtomicUsize,
    /// Periodic sweeps completed.
    pub sweep: AtomicUsize,
}
