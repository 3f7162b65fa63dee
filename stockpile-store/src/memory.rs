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

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use stockpile_common::product::ProductId;

use crate::{error::Result, store::StockStore};

/// Volatile in-memory stock store.
///
/// Loses everything on restart; meant for tests and ephemeral deployments
/// where the warehouse baseline is an acceptable cold-start source.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Arc<RwLock<HashMap<ProductId, u64>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for MemoryStore {
    async fn get(&self, product: &ProductId) -> Result<Option<u64>> {
        Ok(self.map.read().get(product).copied())
    }

    async fn put(&self, product: &ProductId, stock: u64) -> Result<()> {
        self.map.write().insert(product.clone(), stock);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(ProductId, u64)>> {
        Ok(self
            .map
            .read()
            .iter()
            .map(|(product, stock)| (product.clone(), *stock))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&"a".into()).await.unwrap(), None);

        store.put(&"a".into(), 3).await.unwrap();
        store.put(&"a".into(), 4).await.unwrap();
        assert_eq!(store.get(&"a".into()).await.unwrap(), Some(4));
        assert_eq!(store.list().await.unwrap(), vec![("a".into(), 4)]);
    }
}
