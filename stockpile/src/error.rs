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

/// Stock cache error.
///
/// An insufficient-stock retrieval is not an error; it is the `false` branch
/// of [`crate::StockCache::try_retrieve`]. Errors here mean no valid answer
/// could be produced at all.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Persistence failure, propagated from the stock store.
    #[error("store error: {0}")]
    Store(#[from] stockpile_store::Error),
    /// Warehouse collaborator failure on a path that needs a value from it.
    #[error("warehouse error: {0}")]
    Warehouse(#[source] anyhow::Error),
}

/// Stock cache result.
pub type Result<T> = core::result::Result<T, Error>;
