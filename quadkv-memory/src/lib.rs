//! In-memory ordered key-value backend
//!
//! `MemoryBackend` implements the [`Backend`] contract over a `BTreeMap`.
//! It is the development and test backend; persistent deployments plug in
//! their own implementation of the same contract.
//!
//! ## Semantics
//!
//! - Batches apply under a write lock, so they are atomic with respect to
//!   every other operation.
//! - Scans snapshot the requested range at creation time: an in-flight scan
//!   never observes entries from batches applied after it started, and a
//!   batch never surfaces partially.
//! - `approximate_size` counts the range up to a fixed cap, which keeps the
//!   estimate cheap on large stores while staying monotonically consistent
//!   with the exact count.

use async_trait::async_trait;
use futures::stream;
use quadkv_core::backend::{ApproximateSize, Backend, BatchOp, KvStream, ScanOptions};
use quadkv_core::error::{Error, Result};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

/// Entries counted before `approximate_size` stops and reports inexact
const APPROXIMATE_SIZE_CAP: usize = 10_000;

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    open: bool,
}

/// Ordered in-memory backend
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryBackend {
    /// Create a new, empty backend (still needs `open()`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    /// Returns true when no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::backend("memory backend lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::backend("memory backend lock poisoned"))
    }

    fn ensure_open(inner: &Inner) -> Result<()> {
        if inner.open {
            Ok(())
        } else {
            Err(Error::backend("memory backend is not open"))
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn open(&self) -> Result<()> {
        self.write()?.open = true;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.write()?.open = false;
        Ok(())
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.read()?;
        Self::ensure_open(&inner)?;
        Ok(inner.entries.get(key).cloned())
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut inner = self.write()?;
        Self::ensure_open(&inner)?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    inner.entries.insert(key, value);
                }
                BatchOp::Del { key } => {
                    inner.entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan(&self, options: ScanOptions) -> Result<KvStream> {
        let inner = self.read()?;
        Self::ensure_open(&inner)?;
        // Contradictory bounds are an empty scan, not a panic.
        if options.gte >= options.lt {
            return Ok(Box::pin(stream::empty()));
        }
        let range = (
            Bound::Included(options.gte.clone()),
            Bound::Excluded(options.lt.clone()),
        );
        // Snapshot the range now; the stream owns its entries and stays
        // consistent however long the consumer takes to drain it.
        let mut snapshot: Vec<(Vec<u8>, Vec<u8>)> = inner
            .entries
            .range::<Vec<u8>, _>(range)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        drop(inner);

        if options.reverse {
            snapshot.reverse();
        }
        if let Some(limit) = options.limit {
            snapshot.truncate(limit);
        }
        Ok(Box::pin(stream::iter(snapshot.into_iter().map(Ok))))
    }

    async fn approximate_size(&self, lower: &[u8], upper: &[u8]) -> Result<ApproximateSize> {
        let inner = self.read()?;
        Self::ensure_open(&inner)?;
        if lower >= upper {
            return Ok(ApproximateSize {
                size: 0,
                exact: true,
            });
        }
        let range = (
            Bound::Included(lower.to_vec()),
            Bound::Excluded(upper.to_vec()),
        );
        let mut count = 0usize;
        for _ in inner.entries.range::<Vec<u8>, _>(range) {
            count += 1;
            if count >= APPROXIMATE_SIZE_CAP {
                return Ok(ApproximateSize {
                    size: count,
                    exact: false,
                });
            }
        }
        Ok(ApproximateSize {
            size: count,
            exact: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn put(key: &[u8], value: &[u8]) -> BatchOp {
        BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    async fn open_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.open().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_requires_open() {
        let backend = MemoryBackend::new();
        assert!(backend.get(b"k").await.is_err());
        backend.open().await.unwrap();
        assert!(backend.get(b"k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_and_get() {
        let backend = open_backend().await;
        backend
            .batch(vec![put(b"a", b"1"), put(b"b", b"2")])
            .await
            .unwrap();
        assert_eq!(backend.get(b"a").await.unwrap(), Some(b"1".to_vec()));
        backend
            .batch(vec![BatchOp::Del { key: b"a".to_vec() }])
            .await
            .unwrap();
        assert_eq!(backend.get(b"a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_range_order_and_limit() {
        let backend = open_backend().await;
        backend
            .batch(vec![put(b"a", b""), put(b"b", b""), put(b"c", b""), put(b"d", b"")])
            .await
            .unwrap();

        let keys = |opts: ScanOptions| {
            let backend = backend.clone();
            async move {
                backend
                    .scan(opts)
                    .unwrap()
                    .map(|e| e.unwrap().0)
                    .collect::<Vec<_>>()
                    .await
            }
        };

        let forward = keys(ScanOptions {
            gte: b"b".to_vec(),
            lt: b"d".to_vec(),
            ..Default::default()
        })
        .await;
        assert_eq!(forward, vec![b"b".to_vec(), b"c".to_vec()]);

        let reversed = keys(ScanOptions {
            gte: b"a".to_vec(),
            lt: b"z".to_vec(),
            reverse: true,
            limit: Some(2),
            ..Default::default()
        })
        .await;
        assert_eq!(reversed, vec![b"d".to_vec(), b"c".to_vec()]);
    }

    #[tokio::test]
    async fn test_scan_is_a_snapshot() {
        let backend = open_backend().await;
        backend.batch(vec![put(b"a", b"old")]).await.unwrap();

        let stream = backend
            .scan(ScanOptions {
                gte: b"a".to_vec(),
                lt: b"z".to_vec(),
                ..Default::default()
            })
            .unwrap();

        backend
            .batch(vec![put(b"a", b"new"), put(b"b", b"new")])
            .await
            .unwrap();

        let seen: Vec<_> = stream.map(|e| e.unwrap()).collect().await;
        assert_eq!(seen, vec![(b"a".to_vec(), b"old".to_vec())]);
    }

    #[tokio::test]
    async fn test_approximate_size() {
        let backend = open_backend().await;
        let ops: Vec<BatchOp> = (0..100)
            .map(|i| put(format!("k{i:03}").as_bytes(), b""))
            .collect();
        backend.batch(ops).await.unwrap();

        let estimate = backend.approximate_size(b"k", b"l").await.unwrap();
        assert_eq!(estimate.size, 100);
        assert!(estimate.exact);

        let half = backend.approximate_size(b"k000", b"k050").await.unwrap();
        assert_eq!(half.size, 50);
    }
}
