//! QuadStore - the multi-index storage engine
//!
//! The store exclusively owns its backend handle and an immutable index
//! set. Every logical mutation fans out to one key per index and is applied
//! as a single atomic backend batch; direct pattern queries pick the index
//! with the longest bound prefix and answer by range scan.

use crate::error::{Result, StoreError};
use crate::options::{GetOptions, PutOptions, StoreOptions};
use crate::scan::{plan_scan, sort_key, ScanPlan};
use crate::scope::{self, Scope, ScopeRecord};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use quadkv_core::codec::{decode_quad, encode_quad};
use quadkv_core::{
    validate_coverage, ApproximateSize, Backend, BatchOp, Index, Pattern, Quad, ScanOptions,
    TermName,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Keys deleted per batch by `clear` and scope deletion
const DELETE_CHUNK: usize = 10_000;

/// Materialized result of a direct `get`
#[derive(Debug)]
pub struct QuadResult {
    /// Matching quads, in the requested (or index) order
    pub quads: Vec<Quad>,
    /// True when an in-memory resort was needed to honor the requested order
    pub resorted: bool,
}

/// Lazy pull stream of matching quads
pub type QuadStream = BoxStream<'static, Result<Quad>>;

/// Streaming result of `get_stream`
pub struct QuadStreamResult {
    /// The quad stream; dropping it releases the backend cursor
    pub stream: QuadStream,
    /// Term order the stream follows (positions pinned to one term omitted)
    pub order: Vec<TermName>,
    /// True when the stream was buffered and resorted in memory
    pub resorted: bool,
    /// Name of the index that served the scan
    pub index: String,
}

/// The storage engine
#[derive(Debug)]
pub struct QuadStore<B: Backend> {
    backend: B,
    indexes: Arc<[Index]>,
    separator: u8,
    boundary: u8,
}

impl<B: Backend> QuadStore<B> {
    /// Open a store over a backend
    ///
    /// Validates the index set and separator/boundary bytes, then opens the
    /// backend. Returns only once the store is fully usable.
    pub async fn open(backend: B, options: StoreOptions) -> Result<Self> {
        options.validate()?;
        validate_coverage(&options.indexes)?;
        backend.open().await?;
        debug!(
            indexes = options.indexes.len(),
            "opened quad store"
        );
        Ok(QuadStore {
            backend,
            indexes: options.indexes.into(),
            separator: options.separator,
            boundary: options.boundary,
        })
    }

    /// Close the underlying backend
    pub async fn close(&self) -> Result<()> {
        self.backend.close().await?;
        Ok(())
    }

    /// The immutable index set
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Write one quad
    pub async fn put(&self, quad: &Quad) -> Result<()> {
        self.apply(&[], std::slice::from_ref(quad), None).await
    }

    /// Write one quad with options (e.g. a blank-node scope)
    pub async fn put_with(&self, quad: &Quad, options: PutOptions<'_>) -> Result<()> {
        self.apply(&[], std::slice::from_ref(quad), options.scope)
            .await
    }

    /// Write many quads in one atomic batch
    pub async fn multi_put(&self, quads: &[Quad]) -> Result<()> {
        self.apply(&[], quads, None).await
    }

    /// Write many quads in one atomic batch, with options
    pub async fn multi_put_with(&self, quads: &[Quad], options: PutOptions<'_>) -> Result<()> {
        self.apply(&[], quads, options.scope).await
    }

    /// Delete one quad
    pub async fn del(&self, quad: &Quad) -> Result<()> {
        self.apply(std::slice::from_ref(quad), &[], None).await
    }

    /// Delete many quads in one atomic batch
    pub async fn multi_del(&self, quads: &[Quad]) -> Result<()> {
        self.apply(quads, &[], None).await
    }

    /// Atomically replace one quad with another
    pub async fn patch(&self, old: &Quad, new: &Quad) -> Result<()> {
        self.apply(std::slice::from_ref(old), std::slice::from_ref(new), None)
            .await
    }

    /// Atomically replace a set of quads with another
    ///
    /// All deletes and puts land in one backend batch; no intermediate
    /// state is observable by concurrent scans.
    pub async fn multi_patch(&self, old: &[Quad], new: &[Quad]) -> Result<()> {
        self.apply(old, new, None).await
    }

    /// Delete every entry in the store's keyspace (quads and scope records)
    pub async fn clear(&self) -> Result<()> {
        loop {
            let scan = self.backend.scan(ScanOptions {
                gte: Vec::new(),
                lt: vec![0xFF],
                reverse: false,
                limit: Some(DELETE_CHUNK),
            })?;
            let entries: Vec<_> = scan.collect().await;
            if entries.is_empty() {
                return Ok(());
            }
            let mut ops = Vec::with_capacity(entries.len());
            for entry in entries {
                let (key, _) = entry?;
                ops.push(BatchOp::Del { key });
            }
            self.backend.batch(ops).await?;
        }
    }

    /// Build and apply one atomic batch: deletes first, then puts, plus any
    /// scope records minted along the way.
    async fn apply(&self, dels: &[Quad], puts: &[Quad], scope: Option<&mut Scope>) -> Result<()> {
        let mut ops = Vec::with_capacity((dels.len() + puts.len()) * self.indexes.len());
        for quad in dels {
            quad.validate()?;
            for index in self.indexes.iter() {
                ops.push(BatchOp::Del {
                    key: index.key(quad, self.separator)?,
                });
            }
        }
        let mut scope = scope;
        for quad in puts {
            quad.validate()?;
            let quad = match scope.as_deref_mut() {
                Some(scope) => scope.map_quad(quad, self.separator, &mut ops)?,
                None => quad.clone(),
            };
            let value = encode_quad(&quad)?;
            for index in self.indexes.iter() {
                ops.push(BatchOp::Put {
                    key: index.key(&quad, self.separator)?,
                    value: value.clone(),
                });
            }
        }
        trace!(dels = dels.len(), puts = puts.len(), ops = ops.len(), "applying batch");
        self.backend.batch(ops).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Match a pattern, materializing the results
    pub async fn get(&self, pattern: &Pattern, options: &GetOptions) -> Result<QuadResult> {
        pattern.validate()?;
        options.validate()?;
        let plan = self.plan(pattern, options)?;
        debug!(
            index = %self.indexes[plan.index_pos],
            resorted = plan.resorted,
            "direct get"
        );

        // Limits can only be pushed to the backend when nothing is filtered
        // or reordered after the scan.
        let push_limit = if !plan.resorted && plan.residual.is_empty() {
            options
                .limit
                .map(|limit| limit + options.offset.unwrap_or(0))
        } else {
            None
        };
        let mut scan = self.backend.scan(ScanOptions {
            gte: plan.gte.clone(),
            lt: plan.lt.clone(),
            reverse: options.reverse && !plan.resorted,
            limit: push_limit,
        })?;

        let mut quads = Vec::new();
        while let Some(entry) = scan.next().await {
            let (_, value) = entry?;
            let quad = decode_quad(&value)?;
            if plan.residual.matches(&quad)? {
                quads.push(quad);
            }
        }

        if plan.resorted {
            let mut keyed = Vec::with_capacity(quads.len());
            for quad in quads {
                keyed.push((sort_key(&quad, &plan.order, self.separator)?, quad));
            }
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            if options.reverse {
                keyed.reverse();
            }
            quads = keyed.into_iter().map(|(_, quad)| quad).collect();
        }
        if let Some(offset) = options.offset {
            quads.drain(..offset.min(quads.len()));
        }
        if let Some(limit) = options.limit {
            quads.truncate(limit);
        }
        Ok(QuadResult {
            quads,
            resorted: plan.resorted,
        })
    }

    /// Match a pattern as a lazy pull stream
    ///
    /// When the requested order forces a resort, the stream is backed by a
    /// buffered, sorted result; otherwise entries are decoded on demand and
    /// the consumer's pull rate backpressures the backend cursor.
    pub async fn get_stream(
        &self,
        pattern: &Pattern,
        options: &GetOptions,
    ) -> Result<QuadStreamResult> {
        pattern.validate()?;
        options.validate()?;
        let plan = self.plan(pattern, options)?;

        if plan.resorted {
            let order = plan.order.clone();
            let index = self.indexes[plan.index_pos].name().to_string();
            let result = self.get(pattern, options).await?;
            return Ok(QuadStreamResult {
                stream: Box::pin(stream::iter(result.quads.into_iter().map(Ok))),
                order,
                resorted: true,
                index,
            });
        }

        let scan = self.backend.scan(ScanOptions {
            gte: plan.gte.clone(),
            lt: plan.lt.clone(),
            reverse: options.reverse,
            limit: None,
        })?;
        let residual = plan.residual.clone();
        let decoded = scan.filter_map(move |entry| {
            let item = entry
                .map_err(StoreError::from)
                .and_then(|(_, value)| Ok(decode_quad(&value)?))
                .and_then(|quad| Ok(residual.matches(&quad)?.then_some(quad)));
            futures::future::ready(match item {
                Ok(Some(quad)) => Some(Ok(quad)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            })
        });

        let mut to_skip = options.offset.unwrap_or(0);
        let skipped = decoded.filter(move |item| {
            let keep = !(to_skip > 0 && item.is_ok());
            if !keep {
                to_skip -= 1;
            }
            futures::future::ready(keep)
        });
        let stream: QuadStream = match options.limit {
            Some(limit) => Box::pin(skipped.take(limit)),
            None => Box::pin(skipped),
        };

        Ok(QuadStreamResult {
            stream,
            order: plan.order,
            resorted: false,
            index: self.indexes[plan.index_pos].name().to_string(),
        })
    }

    /// Cheap cardinality estimate for a pattern, used only for planning
    ///
    /// Residual constraints are not applied, so the estimate may overcount;
    /// it is never used for correctness.
    pub async fn get_approximate_size(&self, pattern: &Pattern) -> Result<ApproximateSize> {
        pattern.validate()?;
        let plan = plan_scan(
            &self.indexes,
            pattern,
            None,
            self.separator,
            self.boundary,
        )?;
        let mut estimate = self.backend.approximate_size(&plan.gte, &plan.lt).await?;
        if !plan.residual.is_empty() {
            estimate.exact = false;
        }
        Ok(estimate)
    }

    /// Exact count of quads matching a pattern
    pub async fn count(&self, pattern: &Pattern) -> Result<usize> {
        pattern.validate()?;
        let plan = plan_scan(
            &self.indexes,
            pattern,
            None,
            self.separator,
            self.boundary,
        )?;
        let mut scan = self.backend.scan(ScanOptions {
            gte: plan.gte.clone(),
            lt: plan.lt.clone(),
            reverse: false,
            limit: None,
        })?;
        let mut count = 0usize;
        while let Some(entry) = scan.next().await {
            let (_, value) = entry?;
            if plan.residual.is_empty() || plan.residual.matches(&decode_quad(&value)?)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Check whether any quad matches a pattern (first-match probe)
    pub async fn exists(&self, pattern: &Pattern) -> Result<bool> {
        let result = self
            .get(pattern, &GetOptions::new().with_limit(1))
            .await?;
        Ok(!result.quads.is_empty())
    }

    fn plan(&self, pattern: &Pattern, options: &GetOptions) -> Result<ScanPlan> {
        plan_scan(
            &self.indexes,
            pattern,
            options.order.as_deref(),
            self.separator,
            self.boundary,
        )
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// Create a fresh scope with an empty label map
    ///
    /// Nothing is persisted until the scope's first minted label is written
    /// as part of a `put`.
    pub fn init_scope(&self) -> Scope {
        Scope::new(scope::fresh_id())
    }

    /// Reload a scope's label map from its persisted records
    pub async fn load_scope(&self, id: &str) -> Result<Scope> {
        validate_scope_id(id)?;
        let prefix = scope::scope_prefix(id, self.separator);
        let mut upper = prefix.clone();
        upper.push(self.boundary);
        let mut scan = self.backend.scan(ScanOptions {
            gte: prefix.clone(),
            lt: upper,
            reverse: false,
            limit: None,
        })?;
        let mut labels = rustc_hash::FxHashMap::default();
        while let Some(entry) = scan.next().await {
            let (_, value) = entry?;
            let record: ScopeRecord = serde_json::from_slice(&value)
                .map_err(|e| StoreError::scope(format!("corrupt scope record: {e}")))?;
            labels.insert(record.original_label, record.random_label);
        }
        Ok(Scope::with_labels(id.to_string(), labels))
    }

    /// Delete one scope's persisted records
    pub async fn delete_scope(&self, id: &str) -> Result<()> {
        validate_scope_id(id)?;
        let prefix = scope::scope_prefix(id, self.separator);
        self.delete_prefix(prefix).await
    }

    /// Delete every persisted scope record
    pub async fn delete_all_scopes(&self) -> Result<()> {
        self.delete_prefix(scope::namespace_prefix(self.separator))
            .await
    }

    async fn delete_prefix(&self, prefix: Vec<u8>) -> Result<()> {
        let mut upper = prefix.clone();
        upper.push(self.boundary);
        loop {
            let scan = self.backend.scan(ScanOptions {
                gte: prefix.clone(),
                lt: upper.clone(),
                reverse: false,
                limit: Some(DELETE_CHUNK),
            })?;
            let entries: Vec<_> = scan.collect().await;
            if entries.is_empty() {
                return Ok(());
            }
            let mut ops = Vec::with_capacity(entries.len());
            for entry in entries {
                let (key, _) = entry?;
                ops.push(BatchOp::Del { key });
            }
            self.backend.batch(ops).await?;
        }
    }
}

fn validate_scope_id(id: &str) -> Result<()> {
    if id.is_empty() || id.bytes().any(|b| b < 0x20) {
        return Err(StoreError::scope(format!("invalid scope id: {id:?}")));
    }
    Ok(())
}
