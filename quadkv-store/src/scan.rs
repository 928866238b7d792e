//! Index selection and scan-range planning
//!
//! A direct pattern is answered by exactly one index: the one whose term
//! order starts with the longest prefix of term-bound positions. A range
//! constraint on the position immediately after that prefix is folded into
//! the scan bounds; every remaining constraint becomes an in-memory
//! residual filter over decoded quads.
//!
//! The requested output order is always honored. When the chosen index's
//! residual term order (index order minus positions pinned to a single
//! term) does not start with the requested order, the plan marks the scan
//! as needing an in-memory resort.

use crate::error::Result;
use quadkv_core::codec::write_term;
use quadkv_core::{Index, Pattern, TermName};

/// A planned range scan over one index
#[derive(Debug)]
pub(crate) struct ScanPlan {
    /// Position of the chosen index in the store's index set
    pub index_pos: usize,
    /// Inclusive lower key bound
    pub gte: Vec<u8>,
    /// Exclusive upper key bound
    pub lt: Vec<u8>,
    /// Constraints not consumed by the key range, applied after decode
    pub residual: Pattern,
    /// Term order the raw scan yields, with term-pinned positions removed
    pub order: Vec<TermName>,
    /// True when results must be buffered and resorted to honor the
    /// requested order
    pub resorted: bool,
}

pub(crate) fn plan_scan(
    indexes: &[Index],
    pattern: &Pattern,
    requested_order: Option<&[TermName]>,
    separator: u8,
    boundary: u8,
) -> Result<ScanPlan> {
    // Positions pinned to one term never affect relative output order.
    let effective_order: Vec<TermName> = requested_order
        .unwrap_or(&[])
        .iter()
        .copied()
        .filter(|&name| pattern.term(name).is_none())
        .collect();

    let mut best: Option<(usize, usize, bool, bool)> = None;
    for (pos, index) in indexes.iter().enumerate() {
        let prefix_len = index
            .terms()
            .iter()
            .take_while(|&&name| pattern.term(name).is_some())
            .count();
        let range_extends = index
            .terms()
            .get(prefix_len)
            .is_some_and(|&name| pattern.range(name).is_some());
        let achievable = order_achievable(index, pattern, &effective_order);

        let better = match best {
            None => true,
            Some((_, best_prefix, best_range, best_achievable)) => {
                (prefix_len, range_extends, achievable)
                    > (best_prefix, best_range, best_achievable)
            }
        };
        if better {
            best = Some((pos, prefix_len, range_extends, achievable));
        }
    }
    // The index set is validated non-empty at open.
    let (index_pos, prefix_len, range_extends, achievable) =
        best.expect("store holds at least one index");
    let index = &indexes[index_pos];

    let mut gte = index.key_prefix(separator);
    for &name in index.terms().iter().take(prefix_len) {
        let term = pattern.term(name).expect("prefix positions are term-bound");
        write_term(term, &mut gte)?;
        gte.push(separator);
    }
    let mut lt = gte.clone();

    let mut residual = pattern.clone();
    for &name in index.terms().iter().take(prefix_len) {
        *residual.get_mut(name) = None;
    }

    if range_extends {
        let range_name = index.terms()[prefix_len];
        let range = pattern
            .range(range_name)
            .expect("range extension checked above")
            .clone();
        match range.lower() {
            Some((term, inclusive)) => {
                write_term(term, &mut gte)?;
                if !inclusive {
                    // Skip every key of the bound term itself: its keys all
                    // continue `<sep><tag>…`, which sorts below `<sep><boundary>`.
                    gte.push(separator);
                    gte.push(boundary);
                }
            }
            None => {}
        }
        match range.upper() {
            Some((term, inclusive)) => {
                write_term(term, &mut lt)?;
                if inclusive {
                    lt.push(separator);
                    lt.push(boundary);
                }
            }
            None => lt.push(boundary),
        }
        *residual.get_mut(range_name) = None;
    } else {
        lt.push(boundary);
    }

    let order: Vec<TermName> = index
        .terms()
        .iter()
        .copied()
        .filter(|&name| pattern.term(name).is_none())
        .collect();

    Ok(ScanPlan {
        index_pos,
        gte,
        lt,
        residual,
        order: if achievable {
            order
        } else {
            effective_order.clone()
        },
        resorted: !achievable,
    })
}

/// Check whether the requested order is a prefix of the index's residual
/// term order.
fn order_achievable(index: &Index, pattern: &Pattern, requested: &[TermName]) -> bool {
    if requested.is_empty() {
        return true;
    }
    let residual = index
        .terms()
        .iter()
        .copied()
        .filter(|&name| pattern.term(name).is_none());
    residual.take(requested.len()).eq(requested.iter().copied())
}

/// Build the in-memory sort key for a resorted result
pub(crate) fn sort_key(
    quad: &quadkv_core::Quad,
    order: &[TermName],
    separator: u8,
) -> Result<Vec<u8>> {
    let mut key = Vec::with_capacity(32);
    for &name in order {
        write_term(quad.term(name), &mut key)?;
        key.push(separator);
    }
    Ok(key)
}
