//! Filter operator and predicate compilation
//!
//! A filter stage compiles its operator and operands into a boolean
//! predicate over bindings. Comparisons use the term codec's byte order
//! (value order for numerics, lexical order for strings); the prefix
//! operators test the encoded-byte prefix, which for same-kind terms is the
//! natural lexical prefix test.
//!
//! Evaluation is two-valued: a row whose variables are unbound is dropped,
//! never errored.

use crate::binding::Binding;
use crate::error::{Result, SearchError};
use crate::operator::{BoxedOperator, ExecutionContext, Operator, OperatorState};
use crate::parse::{FilterArg, ParsedFilter};
use crate::stage::FilterOp;
use async_trait::async_trait;
use quadkv_core::codec::encode_term;
use quadkv_core::{Backend, Term};
use std::sync::Arc;

/// A filter compiled against its stage operands
#[derive(Clone, Debug)]
pub(crate) struct CompiledFilter {
    op: FilterOp,
    args: Vec<CompiledArg>,
}

#[derive(Clone, Debug)]
enum CompiledArg {
    Variable(Arc<str>),
    /// Constant term with its encoding precomputed
    Constant(Vec<u8>),
}

impl CompiledFilter {
    pub fn compile(parsed: &ParsedFilter) -> Result<Self> {
        let mut args = Vec::with_capacity(parsed.args.len());
        for arg in &parsed.args {
            args.push(match arg {
                FilterArg::Variable(var) => CompiledArg::Variable(Arc::clone(var)),
                FilterArg::Constant(term) => CompiledArg::Constant(encode_term(term)?),
            });
        }
        Ok(CompiledFilter {
            op: parsed.op,
            args,
        })
    }

    /// Evaluate against one binding
    pub fn matches(&self, binding: &Binding) -> Result<bool> {
        let mut encoded = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                CompiledArg::Constant(bytes) => encoded.push(bytes.clone()),
                CompiledArg::Variable(var) => match binding.get(var) {
                    None => return Ok(false),
                    Some(term) => encoded.push(encode_term(term)?),
                },
            }
        }
        let (a, b) = (&encoded[0], &encoded[1]);
        Ok(match self.op {
            FilterOp::Lt => a < b,
            FilterOp::Lte => a <= b,
            FilterOp::Gt => a > b,
            FilterOp::Gte => a >= b,
            FilterOp::Eq => a == b,
            FilterOp::Neq => a != b,
            FilterOp::StartsWith => a.starts_with(b),
            FilterOp::StartsWithout => !a.starts_with(b),
        })
    }
}

/// Operator wrapping a child and dropping non-matching bindings
pub(crate) struct FilterOperator<B: Backend> {
    child: BoxedOperator<B>,
    filter: CompiledFilter,
    state: OperatorState,
}

impl<B: Backend> FilterOperator<B> {
    pub fn new(child: BoxedOperator<B>, filter: CompiledFilter) -> Self {
        FilterOperator {
            child,
            filter,
            state: OperatorState::Created,
        }
    }
}

#[async_trait]
impl<B: Backend> Operator<B> for FilterOperator<B> {
    fn variables(&self) -> &[Arc<str>] {
        self.child.variables()
    }

    fn sorting(&self) -> &[Arc<str>] {
        self.child.sorting()
    }

    async fn open(&mut self, ctx: &ExecutionContext<'_, B>) -> Result<()> {
        if !self.state.can_open() {
            if self.state.is_closed() {
                return Err(SearchError::OperatorClosed);
            }
            return Err(SearchError::OperatorAlreadyOpened);
        }
        self.child.open(ctx).await?;
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
        while let Some(binding) = self.child.next(ctx).await? {
            if self.filter.matches(&binding)? {
                return Ok(Some(binding));
            }
        }
        self.state = OperatorState::Exhausted;
        Ok(None)
    }

    fn close(&mut self) {
        self.child.close();
        self.state = OperatorState::Closed;
    }
}

/// Naive evaluation of a filter against a binding, used by tests and by the
/// planner's correctness checks.
#[allow(dead_code)]
pub(crate) fn evaluate(op: FilterOp, left: &Term, right: &Term) -> Result<bool> {
    let (a, b) = (encode_term(left)?, encode_term(right)?);
    Ok(match op {
        FilterOp::Lt => a < b,
        FilterOp::Lte => a <= b,
        FilterOp::Gt => a > b,
        FilterOp::Gte => a >= b,
        FilterOp::Eq => a == b,
        FilterOp::Neq => a != b,
        FilterOp::StartsWith => a.starts_with(&b),
        FilterOp::StartsWithout => !a.starts_with(&b),
    })
}
