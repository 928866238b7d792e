//! Backend contract: an ordered byte-key-value store
//!
//! The storage engine is layered over any backend that provides atomic
//! batched writes and sorted range iteration. Implementations live in
//! sibling crates (`quadkv-memory` ships the in-memory development backend);
//! embedders bring their own for persistent deployments.
//!
//! Backend I/O errors propagate unchanged — retry policy belongs to the
//! backend or the caller, never to the engine.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;

/// One write operation inside an atomic batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite a key
    Put {
        /// Full key bytes
        key: Vec<u8>,
        /// Value bytes
        value: Vec<u8>,
    },
    /// Remove a key (absent keys are a no-op)
    Del {
        /// Full key bytes
        key: Vec<u8>,
    },
}

/// Options for a sorted range scan
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Inclusive lower key bound
    pub gte: Vec<u8>,
    /// Exclusive upper key bound
    pub lt: Vec<u8>,
    /// Iterate in descending key order
    pub reverse: bool,
    /// Stop after this many entries
    pub limit: Option<usize>,
}

/// A key/value entry yielded by a scan
pub type KvEntry = (Vec<u8>, Vec<u8>);

/// Lazy pull stream of scan entries
///
/// Dropping the stream before exhaustion must release whatever cursor or
/// snapshot the backend holds for it.
pub type KvStream = BoxStream<'static, Result<KvEntry>>;

/// Approximate cardinality of a key range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApproximateSize {
    /// Estimated number of entries in the range
    pub size: usize,
    /// True when the estimate is known to be an exact count
    pub exact: bool,
}

/// An ordered byte-key-value store with atomic batches
#[async_trait]
pub trait Backend: Debug + Send + Sync + 'static {
    /// Open the backend; must be called before any other operation
    async fn open(&self) -> Result<()>;

    /// Close the backend, releasing its resources
    async fn close(&self) -> Result<()>;

    /// Read a single key
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Apply a list of operations as a single atomic unit
    ///
    /// A concurrent scan must never observe a partially applied batch.
    async fn batch(&self, ops: Vec<BatchOp>) -> Result<()>;

    /// Scan a key range in sorted order
    fn scan(&self, options: ScanOptions) -> Result<KvStream>;

    /// Cheap cardinality estimate for a key range, used only for planning
    ///
    /// Backends without native range-size support may fall back to a
    /// bounded count; the result must be monotonically consistent with the
    /// exact count (never larger than it for the same range).
    async fn approximate_size(&self, lower: &[u8], upper: &[u8]) -> Result<ApproximateSize>;
}
