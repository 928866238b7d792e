//! Operator trait and lifecycle types
//!
//! Stage executors form a left-deep tree that produces bindings through the
//! `open/next/close` pull lifecycle. One binding is pulled at a time, so
//! consumers backpressure the underlying range scans naturally, and `close`
//! releases any backend cursors an operator still holds.

use crate::binding::Binding;
use crate::error::Result;
use async_trait::async_trait;
use quadkv_core::Backend;
use quadkv_store::QuadStore;
use std::sync::Arc;

/// Execution context shared by every operator in one search
pub(crate) struct ExecutionContext<'a, B: Backend> {
    /// The storage engine serving the scans
    pub store: &'a QuadStore<B>,
}

/// A pull-based stage executor
///
/// Call `open`, then loop on `next` until `None`, then `close`.
#[async_trait]
pub(crate) trait Operator<B: Backend>: Send {
    /// Variables present in every produced binding
    fn variables(&self) -> &[Arc<str>];

    /// Variables whose binding order is monotonic with respect to the
    /// underlying scan (valid after `open`)
    fn sorting(&self) -> &[Arc<str>];

    /// Initialize state and acquire scans
    async fn open(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<()>;

    /// Pull the next binding, or `None` when exhausted
    async fn next(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<Option<Binding>>;

    /// Release scans and buffers
    fn close(&mut self);
}

/// Boxed operator for dynamic dispatch
pub(crate) type BoxedOperator<B> = Box<dyn Operator<B>>;

/// Operator state for lifecycle tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperatorState {
    /// Not yet opened
    Created,
    /// Opened and ready to produce bindings
    Open,
    /// Exhausted (next returned None)
    Exhausted,
    /// Closed
    Closed,
}

impl OperatorState {
    /// Check if the operator can be opened
    pub fn can_open(self) -> bool {
        matches!(self, OperatorState::Created)
    }

    /// Check if the operator can produce bindings
    pub fn can_next(self) -> bool {
        matches!(self, OperatorState::Open)
    }

    /// Check if the operator is closed
    pub fn is_closed(self) -> bool {
        matches!(self, OperatorState::Closed)
    }
}
