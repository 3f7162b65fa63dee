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

//! Keyed mutual exclusion with self-cleaning slots.

use std::{
    collections::HashMap,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

use ahash::RandomState;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Tasks currently holding or awaiting this slot.
    refs: usize,
}

struct Shards<K> {
    shards: Box<[Mutex<HashMap<K, Slot>>]>,
    hash_builder: RandomState,
}

impl<K> Shards<K>
where
    K: Hash + Eq,
{
    fn shard(&self, key: &K) -> &Mutex<HashMap<K, Slot>> {
        let hash = self.hash_builder.hash_one(key);
        &self.shards[hash as usize % self.shards.len()]
    }

    fn unref(&self, key: &K) {
        let mut shard = self.shard(key).lock();
        if let Some(slot) = shard.get_mut(key) {
            slot.refs -= 1;
            if slot.refs == 0 {
                shard.remove(key);
            }
        }
    }
}

/// Lock manager granting exclusive ownership per key.
///
/// Unlike a lock table that grows with every key ever touched, a slot here
/// lives exactly as long as some task holds or awaits its key: the last
/// released guard removes it. The slot map itself is sharded to keep
/// bookkeeping for unrelated keys from contending.
pub struct KeyLocks<K> {
    shards: Arc<Shards<K>>,
}

impl<K> Clone for KeyLocks<K> {
    fn clone(&self) -> Self {
        Self {
            shards: Arc::clone(&self.shards),
        }
    }
}

impl<K> std::fmt::Debug for KeyLocks<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLocks").finish()
    }
}

impl<K> KeyLocks<K>
where
    K: Hash + Eq + Clone,
{
    /// Create a lock manager with the given shard count.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero.
    pub fn new(shards: usize) -> Self {
        assert!(shards > 0, "shard count must be non-zero");
        let shards = (0..shards).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            shards: Arc::new(Shards {
                shards,
                hash_builder: RandomState::default(),
            }),
        }
    }

    /// Acquire the exclusive lock for `key`, waiting until no other task holds it.
    ///
    /// Locks for different keys never contend beyond the brief sharded map
    /// access. The returned guard releases the lock on drop.
    ///
    /// Cancellation-safe: dropping the future while it waits releases its slot
    /// reference.
    pub async fn lock(&self, key: &K) -> KeyGuard<K> {
        let mutex = {
            let mut shard = self.shards.shard(key).lock();
            let slot = shard.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                refs: 0,
            });
            slot.refs += 1;
            slot.mutex.clone()
        };
        // Armed before the await so a cancelled acquisition still unrefs.
        let release = Release {
            shards: Arc::clone(&self.shards),
            key: key.clone(),
        };
        let guard = mutex.lock_owned().await;
        KeyGuard {
            _guard: guard,
            _release: release,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.shards.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Whether no key is currently held or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Release<K>
where
    K: Hash + Eq,
{
    shards: Arc<Shards<K>>,
    key: K,
}

impl<K> Drop for Release<K>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        self.shards.unref(&self.key);
    }
}

/// Exclusive ownership of one key, released on drop.
pub struct KeyGuard<K>
where
    K: Hash + Eq,
{
    // Field order matters: the mutex must be released before the slot is
    // unrefed, so a racing acquirer always reuses the live slot.
    _guard: OwnedMutexGuard<()>,
    _release: Release<K>,
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU64, Ordering},
        time::Duration,
    };

    use futures::future::join_all;

    use super::*;

    #[tokio::test]
    async fn test_mutual_exclusion_per_key() {
        const TASKS: usize = 100;

        let locks = KeyLocks::new(16);
        let counter = Arc::new(AtomicU64::new(0));

        // A racy read-yield-write that only stays exact under exclusion.
        join_all((0..TASKS).map(|_| {
            let locks = locks.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&"p-1").await;
                let cur = counter.load(Ordering::Relaxed);
                tokio::task::yield_now().await;
                counter.store(cur + 1, Ordering::Relaxed);
            })
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

        assert_eq!(counter.load(Ordering::Relaxed), TASKS as u64);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let locks = KeyLocks::new(16);
        let _a = locks.lock(&"a").await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock(&"b"))
            .await
            .expect("lock on a distinct key must not block");
    }

    #[tokio::test]
    async fn test_same_key_blocks() {
        let locks = KeyLocks::new(16);
        let guard = locks.lock(&"a").await;
        assert!(tokio::time::timeout(Duration::from_millis(50), locks.lock(&"a"))
            .await
            .is_err());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), locks.lock(&"a"))
            .await
            .expect("lock must be acquirable after release");
    }

    #[tokio::test]
    async fn test_slot_reclaimed_after_release() {
        let locks = KeyLocks::new(16);
        {
            let _a = locks.lock(&"a").await;
            let _b = locks.lock(&"b").await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }
}
