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
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use stockpile_common::product::ProductId;
use tokio::sync::Mutex as AsyncMutex;
use twox_hash::XxHash64;

use crate::{
    error::{Error, Result},
    store::StockStore,
};

const MAGIC: u64 = u64::from_le_bytes(*b"SPJNL001");
const HEADER_LEN: u64 = 8;
/// Frame prefix: payload length (u32) + payload checksum (u64).
const FRAME_LEN: usize = 12;
const CHECKSUM_SEED: u64 = 0;

const JOURNAL_FILE: &str = "stock.journal";

/// Journal records accumulated before compaction pays off.
const COMPACT_MIN_RECORDS: usize = 1024;

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    product: ProductId,
    stock: u64,
}

/// Durable stock store backed by an append-only journal file.
///
/// Every put appends one checksummed record and fsyncs before returning, so a
/// put that returned stays visible across restarts. Opening replays the
/// journal into an in-memory index, truncating a torn or corrupt tail left by
/// a crash mid-append, and rewrites the file down to one record per live
/// product once enough dead records accumulate.
#[derive(Clone)]
pub struct JournalStore {
    inner: Arc<JournalInner>,
}

impl std::fmt::Debug for JournalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalStore").finish()
    }
}

struct JournalInner {
    map: RwLock<HashMap<ProductId, u64>>,
    /// Serializes appenders. The handle is checked out into the blocking pool
    /// for the duration of one write and released with the guard.
    file: AsyncMutex<Arc<Mutex<File>>>,
}

impl JournalStore {
    /// Open or create a journal store in `dir`.
    ///
    /// The directory and journal file are created on first use.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        asyncify(move || Self::open_blocking(&dir)).await
    }

    fn open_blocking(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE);
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;

        let file_len = file.metadata()?.len();
        if file_len < HEADER_LEN {
            // Fresh, or a crash landed before the header did.
            file.set_len(0)?;
            file.write_all(&MAGIC.to_le_bytes())?;
            file.sync_data()?;
            return Ok(Self::from_parts(HashMap::new(), file));
        }

        file.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 8];
        file.read_exact(&mut magic)?;
        let magic = u64::from_le_bytes(magic);
        if magic != MAGIC {
            return Err(Error::MagicMismatch {
                magic,
                expected: MAGIC,
            });
        }

        let mut buf = Vec::with_capacity((file_len - HEADER_LEN) as usize);
        file.read_to_end(&mut buf)?;

        let mut map = HashMap::new();
        let mut records = 0usize;
        let mut offset = 0usize;
        loop {
            let remaining = buf.len() - offset;
            if remaining == 0 {
                break;
            }
            if remaining < FRAME_LEN {
                tracing::warn!("[journal]: torn frame header at tail, dropping {remaining} bytes");
                break;
            }
            let mut len = [0u8; 4];
            len.copy_from_slice(&buf[offset..offset + 4]);
            let len = u32::from_le_bytes(len) as usize;
            let mut checksum = [0u8; 8];
            checksum.copy_from_slice(&buf[offset + 4..offset + FRAME_LEN]);
            let checksum = u64::from_le_bytes(checksum);
            if remaining - FRAME_LEN < len {
                tracing::warn!("[journal]: torn record at tail, dropping {remaining} bytes");
                break;
            }
            let payload = &buf[offset + FRAME_LEN..offset + FRAME_LEN + len];
            if XxHash64::oneshot(CHECKSUM_SEED, payload) != checksum {
                tracing::warn!("[journal]: checksum mismatch at tail, dropping {remaining} bytes");
                break;
            }
            let record: Record = bincode::deserialize(payload)?;
            map.insert(record.product, record.stock);
            records += 1;
            offset += FRAME_LEN + len;
        }

        let valid_len = HEADER_LEN + offset as u64;
        if valid_len < file_len {
            file.set_len(valid_len)?;
            file.sync_data()?;
        }

        if records >= COMPACT_MIN_RECORDS && records >= map.len() * 2 {
            file = Self::compact(&path, &map)?;
            tracing::info!(
                "[journal]: compacted {records} records into {} live products",
                map.len()
            );
        }

        Ok(Self::from_parts(map, file))
    }

    /// Rewrite the journal with one record per live product, atomically
    /// replacing the old file.
    fn compact(path: &Path, map: &HashMap<ProductId, u64>) -> Result<File> {
        let tmp = path.with_extension("compact");
        {
            let mut file = OpenOptions::new().create(true).truncate(true).write(true).open(&tmp)?;
            file.write_all(&MAGIC.to_le_bytes())?;
            for (product, stock) in map {
                file.write_all(&encode(product, *stock)?)?;
            }
            file.sync_data()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(OpenOptions::new().read(true).append(true).open(path)?)
    }

    fn from_parts(map: HashMap<ProductId, u64>, file: File) -> Self {
        Self {
            inner: Arc::new(JournalInner {
                map: RwLock::new(map),
                file: AsyncMutex::new(Arc::new(Mutex::new(file))),
            }),
        }
    }
}

impl StockStore for JournalStore {
    async fn get(&self, product: &ProductId) -> Result<Option<u64>> {
        Ok(self.inner.map.read().get(product).copied())
    }

    async fn put(&self, product: &ProductId, stock: u64) -> Result<()> {
        let frame = encode(product, stock)?;
        // Hold the appender lock until the index reflects the append, so the
        // journal order always matches the index order.
        let handle = self.inner.file.lock().await;
        let file = Arc::clone(&handle);
        asyncify(move || {
            let mut file = file.lock();
            file.write_all(&frame)?;
            file.sync_data()
        })
        .await?;
        self.inner.map.write().insert(product.clone(), stock);
        drop(handle);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(ProductId, u64)>> {
        Ok(self
            .inner
            .map
            .read()
            .iter()
            .map(|(product, stock)| (product.clone(), *stock))
            .collect())
    }
}

fn encode(product: &ProductId, stock: u64) -> Result<Vec<u8>> {
    let payload = bincode::serialize(&Record {
        product: product.clone(),
        stock,
    })?;
    let mut frame = Vec::with_capacity(FRAME_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&XxHash64::oneshot(CHECKSUM_SEED, &payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Convert a blocking call into an async call on the blocking pool.
async fn asyncify<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_reopen_recovers_puts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JournalStore::open(dir.path()).await.unwrap();
            store.put(&"a".into(), 10).await.unwrap();
            store.put(&"b".into(), 5).await.unwrap();
            store.put(&"a".into(), 7).await.unwrap();
        }

        let store = JournalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&"a".into()).await.unwrap(), Some(7));
        assert_eq!(store.get(&"b".into()).await.unwrap(), Some(5));
        assert_eq!(store.get(&"never-seen".into()).await.unwrap(), None);

        let mut all = store.list().await.unwrap();
        all.sort();
        assert_eq!(all, vec![("a".into(), 7), ("b".into(), 5)]);
    }

    #[test_log::test(tokio::test)]
    async fn test_torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JournalStore::open(dir.path()).await.unwrap();
            store.put(&"a".into(), 10).await.unwrap();
            store.put(&"b".into(), 20).await.unwrap();
        }

        // Simulate a crash mid-append: fewer bytes than a frame header.
        let path = dir.path().join(JOURNAL_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xde, 0xad, 0xbe]).unwrap();
        drop(file);

        let store = JournalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&"a".into()).await.unwrap(), Some(10));
        assert_eq!(store.get(&"b".into()).await.unwrap(), Some(20));

        // Appends land cleanly after recovery.
        store.put(&"c".into(), 1).await.unwrap();
        drop(store);
        let store = JournalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&"c".into()).await.unwrap(), Some(1));
    }

    #[test_log::test(tokio::test)]
    async fn test_corrupt_checksum_drops_tail() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JournalStore::open(dir.path()).await.unwrap();
            store.put(&"a".into(), 10).await.unwrap();
        }

        // A full frame whose checksum does not match its payload.
        let path = dir.path().join(JOURNAL_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&4u32.to_le_bytes()).unwrap();
        file.write_all(&0u64.to_le_bytes()).unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();
        drop(file);

        let store = JournalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&"a".into()).await.unwrap(), Some(10));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_magic_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(JOURNAL_FILE), b"NOTMAGIC").unwrap();

        let err = JournalStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::MagicMismatch { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_compaction_rewrites_dead_records() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JournalStore::open(dir.path()).await.unwrap();
            for stock in 0..COMPACT_MIN_RECORDS as u64 {
                store.put(&"hot".into(), stock).await.unwrap();
            }
            store.put(&"cold".into(), 42).await.unwrap();
        }

        let path = dir.path().join(JOURNAL_FILE);
        let before = std::fs::metadata(&path).unwrap().len();

        let store = JournalStore::open(dir.path()).await.unwrap();
        let after = std::fs::metadata(&path).unwrap().len();
        assert!(after < before);
        assert_eq!(
            store.get(&"hot".into()).await.unwrap(),
            Some(COMPACT_MIN_RECORDS as u64 - 1)
        );
        assert_eq!(store.get(&"cold".into()).await.unwrap(), Some(42));

        // The compacted journal still accepts appends.
        store.put(&"hot".into(), 1).await.unwrap();
        drop(store);
        let store = JournalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&"hot".into()).await.unwrap(), Some(1));
    }
}
