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

//! Fuzzy test for concurrent stock mutations.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::join_all;
use rand::{rng, Rng};
use stockpile::{prelude::*, test_utils::MockWarehouse};

const PRODUCTS: usize = 4;
const TASKS: usize = 16;
const OPS: usize = 200;
const BASELINE: u64 = 10_000;

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn test_concurrent_mutations_conserve_stock() {
    let warehouse = MockWarehouse::new();
    let products: Vec<ProductId> = (0..PRODUCTS)
        .map(|i| ProductId::new(format!("p-{i}")))
        .collect();
    for product in &products {
        warehouse.set_baseline(product, BASELINE);
    }

    let cache = StockCacheBuilder::new()
        .with_sync_interval(Duration::from_millis(50))
        .store(MemoryStore::new())
        .warehouse(warehouse.clone())
        .build()
        .await;

    let added: Arc<Vec<AtomicU64>> = Arc::new((0..PRODUCTS).map(|_| AtomicU64::new(0)).collect());
    let retrieved: Arc<Vec<AtomicU64>> =
        Arc::new((0..PRODUCTS).map(|_| AtomicU64::new(0)).collect());

    let handles = (0..TASKS)
        .map(|_| {
            let cache = cache.clone();
            let products = products.clone();
            let added = Arc::clone(&added);
            let retrieved = Arc::clone(&retrieved);
            tokio::spawn(async move {
                for _ in 0..OPS {
                    let (index, amount, restock) = {
                        let mut rng = rng();
                        (
                            rng.random_range(0..PRODUCTS),
                            rng.random_range(1..=5u64),
                            rng.random_bool(0.5),
                        )
                    };
                    let product = &products[index];
                    if restock {
                        cache.add_stock(product, amount).await.unwrap();
                        added[index].fetch_add(amount, Ordering::Relaxed);
                    } else if cache.try_retrieve(product, amount).await.unwrap() {
                        retrieved[index].fetch_add(amount, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    join_all(handles)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    // Every applied mutation is accounted for, none applied twice.
    for (index, product) in products.iter().enumerate() {
        let expected = BASELINE + added[index].load(Ordering::Relaxed)
            - retrieved[index].load(Ordering::Relaxed);
        assert_eq!(cache.get(product).await.unwrap(), expected);
    }

    // With the workload settled, reconciliation reports the settled values.
    for product in &products {
        cache.reconcile(product).await.unwrap();
        assert_eq!(
            warehouse.pushed(product),
            Some(cache.get(product).await.unwrap())
        );
    }

    cache.close().await;
}
