//! Search execution
//!
//! A search runs the `parse → optimize → execute → skip/take` state
//! machine: the validated pipeline is rewritten by the planner, lowered to
//! a left-deep operator tree, then drained one binding at a time. A
//! terminal construct stage turns the drained bindings into quads.

use crate::binding::Binding;
use crate::bgp::BgpOperator;
use crate::construct::construct_quads;
use crate::error::{Result, SearchError};
use crate::filter::{CompiledFilter, FilterOperator};
use crate::join::NestedLoopJoinOperator;
use crate::operator::{BoxedOperator, ExecutionContext, Operator};
use crate::parse::{parse, ParsedStage};
use crate::planner::optimize;
use crate::project::ProjectOperator;
use crate::stage::{QuadPattern, SearchStage};
use quadkv_core::{Backend, Quad};
use quadkv_store::QuadStore;
use std::sync::Arc;
use tracing::debug;

/// Options for search execution
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
    /// Run the cost-based optimizer (on by default; disable to execute the
    /// pipeline exactly as written)
    pub optimize: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: None,
            offset: None,
            optimize: true,
        }
    }
}

impl SearchOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` results
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Disable the optimizer
    pub fn without_optimizer(mut self) -> Self {
        self.optimize = false;
        self
    }
}

/// Result of a search
#[derive(Debug)]
pub enum SearchResults {
    /// Binding solutions (pipelines ending in bgp/filter/project)
    Bindings {
        /// Variables present in every binding
        variables: Vec<Arc<str>>,
        /// Variables whose order is monotonic w.r.t. the executed scans
        sorting: Vec<Arc<str>>,
        /// The solutions
        bindings: Vec<Binding>,
    },
    /// Constructed quads (pipelines ending in construct)
    Quads(Vec<Quad>),
}

impl SearchResults {
    /// Number of results
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Bindings { bindings, .. } => bindings.len(),
            SearchResults::Quads(quads) => quads.len(),
        }
    }

    /// True when the search produced nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The search engine: a stage pipeline executor over one storage engine
pub struct SearchEngine<'a, B: Backend> {
    store: &'a QuadStore<B>,
}

impl<'a, B: Backend> SearchEngine<'a, B> {
    /// Create an engine borrowing a storage engine
    pub fn new(store: &'a QuadStore<B>) -> Self {
        SearchEngine { store }
    }

    /// Parse, optimize and execute a stage pipeline
    pub async fn search(
        &self,
        stages: &[SearchStage],
        options: &SearchOptions,
    ) -> Result<SearchResults> {
        let parsed = parse(stages)?;
        let parsed = if options.optimize {
            optimize(self.store, parsed).await?
        } else {
            parsed
        };
        debug!(stages = parsed.len(), optimized = options.optimize, "executing search");

        let mut pipeline = parsed;
        let construct = match pipeline.last() {
            Some(ParsedStage::Construct { .. }) => {
                let Some(ParsedStage::Construct { patterns }) = pipeline.pop() else {
                    unreachable!("checked by the match above")
                };
                Some(patterns)
            }
            _ => None,
        };

        let mut op = build_operators::<B>(pipeline)?;
        let ctx = ExecutionContext { store: self.store };
        op.open(&ctx).await?;
        let outcome = drive(op.as_mut(), &ctx, construct.as_deref(), options).await;
        op.close();
        outcome
    }
}

/// Lower a parsed pipeline to a left-deep operator tree
fn build_operators<B: Backend>(stages: Vec<ParsedStage>) -> Result<BoxedOperator<B>> {
    let mut stages = stages.into_iter();
    let Some(ParsedStage::Bgp(first)) = stages.next() else {
        return Err(SearchError::invalid_pipeline(
            "the first stage must be a bgp",
        ));
    };
    let mut op: BoxedOperator<B> = Box::new(BgpOperator::new(first));
    for stage in stages {
        op = match stage {
            ParsedStage::Bgp(bgp) => Box::new(NestedLoopJoinOperator::new(op, bgp)),
            ParsedStage::Filter(filter) => {
                Box::new(FilterOperator::new(op, CompiledFilter::compile(&filter)?))
            }
            ParsedStage::Project { variables } => Box::new(ProjectOperator::new(op, variables)),
            ParsedStage::Construct { .. } => {
                return Err(SearchError::unsupported_stage(
                    "construct must be the terminal stage",
                ))
            }
        };
    }
    Ok(op)
}

/// Drain the operator tree, applying skip/take to the final output
async fn drive<B: Backend>(
    op: &mut dyn Operator<B>,
    ctx: &ExecutionContext<'_, B>,
    construct: Option<&[QuadPattern]>,
    options: &SearchOptions,
) -> Result<SearchResults> {
    let mut skip = options.offset.unwrap_or(0);
    match construct {
        None => {
            let mut bindings = Vec::new();
            while let Some(binding) = op.next(ctx).await? {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                bindings.push(binding);
                if options.limit.is_some_and(|limit| bindings.len() >= limit) {
                    break;
                }
            }
            Ok(SearchResults::Bindings {
                variables: op.variables().to_vec(),
                sorting: op.sorting().to_vec(),
                bindings,
            })
        }
        Some(templates) => {
            let mut quads = Vec::new();
            'bindings: while let Some(binding) = op.next(ctx).await? {
                for quad in construct_quads(templates, &binding)? {
                    if skip > 0 {
                        skip -= 1;
                        continue;
                    }
                    quads.push(quad);
                    if options.limit.is_some_and(|limit| quads.len() >= limit) {
                        break 'bindings;
                    }
                }
            }
            Ok(SearchResults::Quads(quads))
        }
    }
}
