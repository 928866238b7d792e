//! Cost-based pipeline optimizer
//!
//! Two pure rewrite passes over a parsed stage list. The produced binding
//! set is unchanged; only execution cost and stage order move.
//!
//! 1. **Filter pushdown** — every single-variable comparison filter is
//!    turned into a term range and merged into the pattern of each BGP
//!    stage binding that variable, taking the tightest bound when several
//!    filters overlap. The filter stage itself stays in the pipeline; the
//!    range only narrows the scans.
//! 2. **Reordering** — BGP stages are sorted ascending by the approximate
//!    size of their (now range-narrowed) patterns, so the smallest expected
//!    result drives the outer loop of the join. The sort is stable: equal
//!    estimates keep their original relative order. Each filter is then
//!    placed after the earliest BGP whose accumulated variables satisfy it;
//!    project and construct stages go last in original relative order.

use crate::error::Result;
use crate::parse::{FilterArg, ParsedFilter, ParsedStage};
use crate::stage::FilterOp;
use quadkv_core::{Backend, Term, TermOrRange, TermRange};
use quadkv_store::QuadStore;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// Rewrite a parsed pipeline for cheaper execution
pub(crate) async fn optimize<B: Backend>(
    store: &QuadStore<B>,
    stages: Vec<ParsedStage>,
) -> Result<Vec<ParsedStage>> {
    if stages.len() <= 1 {
        return Ok(stages);
    }
    let stages = push_down_filters(stages)?;
    reorder(store, stages).await
}

/// Pass 1: merge single-variable comparison filters into BGP scan ranges
fn push_down_filters(mut stages: Vec<ParsedStage>) -> Result<Vec<ParsedStage>> {
    let mut ranges: Vec<(Arc<str>, TermRange)> = Vec::new();
    for stage in &stages {
        if let ParsedStage::Filter(filter) = stage {
            if let Some((variable, range)) = range_from_filter(filter) {
                ranges.push((variable, range));
            }
        }
    }
    for (variable, range) in &ranges {
        for stage in stages.iter_mut() {
            let ParsedStage::Bgp(bgp) = stage else {
                continue;
            };
            let positions: Vec<_> = bgp
                .var_positions
                .iter()
                .filter(|(_, v)| v == variable)
                .map(|(name, _)| *name)
                .collect();
            for name in positions {
                match bgp.pattern.get_mut(name) {
                    Some(TermOrRange::Range(existing)) => existing.merge(range)?,
                    // A concrete term is already tighter than any range.
                    Some(TermOrRange::Term(_)) => {}
                    slot => *slot = Some(TermOrRange::Range(range.clone())),
                }
            }
        }
    }
    Ok(stages)
}

/// Derive a term range from a single-variable comparison filter
fn range_from_filter(filter: &ParsedFilter) -> Option<(Arc<str>, TermRange)> {
    if !filter.op.is_comparison() {
        return None;
    }
    match (&filter.args[0], &filter.args[1]) {
        (FilterArg::Variable(var), FilterArg::Constant(constant)) => {
            Some((Arc::clone(var), range_for(filter.op, constant.clone())))
        }
        (FilterArg::Constant(constant), FilterArg::Variable(var)) => Some((
            Arc::clone(var),
            range_for(flipped(filter.op), constant.clone()),
        )),
        _ => None,
    }
}

fn range_for(op: FilterOp, bound: Term) -> TermRange {
    match op {
        FilterOp::Lt => TermRange::new().with_lt(bound),
        FilterOp::Lte => TermRange::new().with_lte(bound),
        FilterOp::Gt => TermRange::new().with_gt(bound),
        FilterOp::Gte => TermRange::new().with_gte(bound),
        _ => TermRange::new(),
    }
}

fn flipped(op: FilterOp) -> FilterOp {
    match op {
        FilterOp::Lt => FilterOp::Gt,
        FilterOp::Lte => FilterOp::Gte,
        FilterOp::Gt => FilterOp::Lt,
        FilterOp::Gte => FilterOp::Lte,
        other => other,
    }
}

/// Pass 2: reorder BGPs by estimated cardinality, relocate filters
async fn reorder<B: Backend>(
    store: &QuadStore<B>,
    stages: Vec<ParsedStage>,
) -> Result<Vec<ParsedStage>> {
    let mut bgps = Vec::new();
    let mut filters = Vec::new();
    let mut tail = Vec::new();
    for stage in stages {
        match stage {
            ParsedStage::Bgp(bgp) => bgps.push(bgp),
            ParsedStage::Filter(filter) => filters.push(filter),
            other => tail.push(other),
        }
    }

    let mut sized = Vec::with_capacity(bgps.len());
    for bgp in bgps {
        let estimate = store.get_approximate_size(&bgp.pattern).await?;
        sized.push((estimate.size, bgp));
    }
    // Stable: equal estimates preserve original relative order.
    sized.sort_by_key(|(size, _)| *size);
    debug!(
        sizes = ?sized.iter().map(|(size, _)| *size).collect::<Vec<_>>(),
        "reordered bgp stages"
    );

    let mut result = Vec::with_capacity(sized.len() + filters.len() + tail.len());
    let mut bound: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut pending = filters;
    for (_, bgp) in sized {
        bound.extend(bgp.variables.iter().cloned());
        result.push(ParsedStage::Bgp(bgp));
        let mut leftover = Vec::with_capacity(pending.len());
        for filter in pending {
            if filter.variables.iter().all(|v| bound.contains(v)) {
                result.push(ParsedStage::Filter(filter));
            } else {
                leftover.push(filter);
            }
        }
        pending = leftover;
    }
    // Filters whose variables were narrowed away would have failed parse
    // validation; anything left here keeps its original position semantics.
    result.extend(pending.into_iter().map(ParsedStage::Filter));
    result.extend(tail);
    Ok(result)
}
