//! Project operator - restricts bindings to a variable list
//!
//! A `*` projection passes bindings through unchanged. Otherwise the
//! binding's key set is restricted to the requested variables and the
//! inherited sorting is intersected with the retained set.

use crate::binding::Binding;
use crate::error::{Result, SearchError};
use crate::operator::{BoxedOperator, ExecutionContext, Operator, OperatorState};
use async_trait::async_trait;
use quadkv_core::Backend;
use std::sync::Arc;

pub(crate) struct ProjectOperator<B: Backend> {
    child: BoxedOperator<B>,
    /// Retained variables; `None` means `*`
    variables: Option<Vec<Arc<str>>>,
    output_variables: Vec<Arc<str>>,
    sorting: Vec<Arc<str>>,
    state: OperatorState,
}

impl<B: Backend> ProjectOperator<B> {
    pub fn new(child: BoxedOperator<B>, variables: Option<Vec<Arc<str>>>) -> Self {
        let output_variables = match &variables {
            Some(retained) => retained.clone(),
            None => child.variables().to_vec(),
        };
        ProjectOperator {
            child,
            variables,
            output_variables,
            sorting: Vec::new(),
            state: OperatorState::Created,
        }
    }
}

#[async_trait]
impl<B: Backend> Operator<B> for ProjectOperator<B> {
    fn variables(&self) -> &[Arc<str>] {
        &self.output_variables
    }

    fn sorting(&self) -> &[Arc<str>] {
        &self.sorting
    }

    async fn open(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<()> {
        if !self.state.can_open() {
            if self.state.is_closed() {
                return Err(SearchError::OperatorClosed);
            }
            return Err(SearchError::OperatorAlreadyOpened);
        }
        self.child.open(ctx).await?;
        self.sorting = match &self.variables {
            None => self.child.sorting().to_vec(),
            Some(retained) => self
                .child
                .sorting()
                .iter()
                .filter(|v| retained.contains(v))
                .cloned()
                .collect(),
        };
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
        match self.child.next(ctx).await? {
            None => {
                self.state = OperatorState::Exhausted;
                Ok(None)
            }
            Some(binding) => Ok(Some(match &self.variables {
                None => binding,
                Some(retained) => binding.restricted(retained),
            })),
        }
    }

    fn close(&mut self) {
        self.child.close();
        self.state = OperatorState::Closed;
    }
}
