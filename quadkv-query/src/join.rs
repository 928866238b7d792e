//! Nested-loop join operator
//!
//! The pipeline executes as a left-deep chain of nested-loop joins: for
//! each binding produced by the stages so far, the next BGP's pattern is
//! specialized — already-bound variables become concrete terms — and
//! re-queried against the storage engine. Each inner scan is fully drained
//! before the next outer binding is pulled, so inner scans never
//! interleave. The merged binding takes right-hand values on collision,
//! consistent with left-to-right stage order.

use crate::bgp::{bind_quad, term_fits};
use crate::binding::Binding;
use crate::error::{Result, SearchError};
use crate::operator::{BoxedOperator, ExecutionContext, Operator, OperatorState};
use crate::parse::ParsedBgp;
use async_trait::async_trait;
use futures::StreamExt;
use quadkv_core::{Backend, TermOrRange};
use quadkv_store::{GetOptions, QuadStream};
use std::sync::Arc;
use tracing::trace;

pub(crate) struct NestedLoopJoinOperator<B: Backend> {
    left: BoxedOperator<B>,
    right: ParsedBgp,
    variables: Vec<Arc<str>>,
    sorting: Vec<Arc<str>>,
    /// Current outer binding and its (partially drained) inner scan
    current: Option<(Binding, QuadStream)>,
    state: OperatorState,
}

impl<B: Backend> NestedLoopJoinOperator<B> {
    pub fn new(left: BoxedOperator<B>, right: ParsedBgp) -> Self {
        let mut variables = left.variables().to_vec();
        for var in crate::bgp::stage_variables(&right) {
            if !variables.contains(&var) {
                variables.push(var);
            }
        }
        NestedLoopJoinOperator {
            left,
            right,
            variables,
            sorting: Vec::new(),
            current: None,
            state: OperatorState::Created,
        }
    }

    /// Specialize the right pattern for one outer binding.
    ///
    /// Returns `None` when a bound value cannot occupy its position (for
    /// example a literal flowing into a subject slot): such an outer
    /// binding joins with nothing.
    fn specialize(&self, outer: &Binding) -> Option<quadkv_core::Pattern> {
        let mut pattern = self.right.pattern.clone();
        for (name, var) in &self.right.var_positions {
            if let Some(term) = outer.get(var) {
                if !term_fits(*name, term) {
                    return None;
                }
                // A concrete term supersedes any pushed-down range.
                *pattern.get_mut(*name) = Some(TermOrRange::Term(term.clone()));
            }
        }
        Some(pattern)
    }
}

#[async_trait]
impl<B: Backend> Operator<B> for NestedLoopJoinOperator<B> {
    fn variables(&self) -> &[Arc<str>] {
        &self.variables
    }

    fn sorting(&self) -> &[Arc<str>] {
        // Output is ordered outer-major; inner order only refines bindings
        // sharing an outer prefix, so the left sorting is what we can
        // guarantee.
        &self.sorting
    }

    async fn open(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<()> {
        if !self.state.can_open() {
            if self.state.is_closed() {
                return Err(SearchError::OperatorClosed);
            }
            return Err(SearchError::OperatorAlreadyOpened);
        }
        self.left.open(ctx).await?;
        self.sorting = self.left.sorting().to_vec();
        self.state = OperatorState::Open;
        Ok(())
    }

    async fn next(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<Option<Binding>> {
        if !self.state.can_next() {
            if self.state == OperatorState::Created {
                return Err(SearchError::OperatorNotOpened);
            }
            return Ok(None);
        }
        loop {
            if let Some((outer, stream)) = &mut self.current {
                while let Some(quad) = stream.next().await {
                    let quad = quad?;
                    if let Some(inner) = bind_quad(&self.right, &quad) {
                        return Ok(Some(outer.merged(&inner)));
                    }
                }
                self.current = None;
            }
            match self.left.next(ctx).await? {
                None => {
                    self.state = OperatorState::Exhausted;
                    return Ok(None);
                }
                Some(outer) => match self.specialize(&outer) {
                    None => {
                        trace!("outer binding incompatible with inner pattern, skipping");
                        continue;
                    }
                    Some(pattern) => {
                        let result = ctx
                            .store
                            .get_stream(&pattern, &GetOptions::default())
                            .await?;
                        self.current = Some((outer, result.stream));
                    }
                },
            }
        }
    }

    fn close(&mut self) {
        self.current = None;
        self.left.close();
        self.state = OperatorState::Closed;
    }
}
