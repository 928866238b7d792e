//! BGP scan operator
//!
//! Executes one basic graph pattern by asking the storage engine for its
//! bound-term pattern as a lazy stream, then mapping each matching quad to
//! a binding through the stage's position→variable map. The binding order
//! (`sorting`) is inherited from whichever index term-order survived the
//! projection to variable positions.

use crate::binding::Binding;
use crate::error::{Result, SearchError};
use crate::operator::{ExecutionContext, Operator, OperatorState};
use crate::parse::ParsedBgp;
use async_trait::async_trait;
use futures::StreamExt;
use quadkv_core::{Backend, Quad, Term, TermName};
use quadkv_store::{GetOptions, QuadStream};
use std::sync::Arc;

/// Scan operator for one BGP stage
pub(crate) struct BgpOperator {
    parsed: ParsedBgp,
    variables: Vec<Arc<str>>,
    sorting: Vec<Arc<str>>,
    stream: Option<QuadStream>,
    state: OperatorState,
}

impl BgpOperator {
    pub fn new(parsed: ParsedBgp) -> Self {
        let variables = stage_variables(&parsed);
        BgpOperator {
            parsed,
            variables,
            sorting: Vec::new(),
            stream: None,
            state: OperatorState::Created,
        }
    }
}

#[async_trait]
impl<B: Backend> Operator<B> for BgpOperator {
    fn variables(&self) -> &[Arc<str>] {
        &self.variables
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
        let result = ctx
            .store
            .get_stream(&self.parsed.pattern, &GetOptions::default())
            .await?;
        self.sorting = sorting_from_order(&self.parsed, &result.order);
        self.stream = Some(result.stream);
        self.state = OperatorState::Open;
        Ok(())
    }

    async fn next(&mut self, _ctx: &ExecutionContext<'_, B>) -> Result<Option<Binding>> {
        if !self.state.can_next() {
            if self.state == OperatorState::Created {
                return Err(SearchError::OperatorNotOpened);
            }
            return Ok(None);
        }
        let stream = self.stream.as_mut().ok_or(SearchError::OperatorNotOpened)?;
        while let Some(quad) = stream.next().await {
            let quad = quad?;
            if let Some(binding) = bind_quad(&self.parsed, &quad) {
                return Ok(Some(binding));
            }
        }
        self.state = OperatorState::Exhausted;
        self.stream = None;
        Ok(None)
    }

    fn close(&mut self) {
        self.stream = None;
        self.state = OperatorState::Closed;
    }
}

/// Variables of a parsed BGP, in position order
pub(crate) fn stage_variables(parsed: &ParsedBgp) -> Vec<Arc<str>> {
    let mut seen = Vec::with_capacity(parsed.var_positions.len());
    for (_, var) in &parsed.var_positions {
        if !seen.contains(var) {
            seen.push(Arc::clone(var));
        }
    }
    seen
}

/// Project a storage term-order onto this stage's variables
pub(crate) fn sorting_from_order(parsed: &ParsedBgp, order: &[TermName]) -> Vec<Arc<str>> {
    let mut sorting = Vec::new();
    for &name in order {
        if let Some((_, var)) = parsed.var_positions.iter().find(|(n, _)| *n == name) {
            if !sorting.contains(var) {
                sorting.push(Arc::clone(var));
            }
        }
    }
    sorting
}

/// Map a matching quad to a binding
///
/// Returns `None` when the same variable occurs at several positions with
/// conflicting terms (an intra-pattern join miss).
pub(crate) fn bind_quad(parsed: &ParsedBgp, quad: &Quad) -> Option<Binding> {
    let mut binding = Binding::new();
    for (name, var) in &parsed.var_positions {
        let term = quad.term(*name).clone();
        if let Some(previous) = binding.set(Arc::clone(var), term.clone()) {
            if previous != term {
                return None;
            }
        }
    }
    Some(binding)
}

/// Check whether a term may occupy a quad position
///
/// Used when substituting outer-binding values into an inner pattern: an
/// incompatible substitution means "no matches", not an error.
pub(crate) fn term_fits(name: TermName, term: &Term) -> bool {
    match name {
        TermName::Subject => matches!(term, Term::NamedNode { .. } | Term::BlankNode { .. }),
        TermName::Predicate => matches!(term, Term::NamedNode { .. }),
        TermName::Object => !matches!(term, Term::DefaultGraph | Term::Variable { .. }),
        TermName::Graph => {
            matches!(
                term,
                Term::NamedNode { .. } | Term::BlankNode { .. } | Term::DefaultGraph
            )
        }
    }
}
