//! Stage parsing and pipeline validation
//!
//! Parsing turns raw stage descriptors into parsed stages carrying their
//! free-variable sets and, for BGP stages, a term/variable partition: the
//! bound positions become a core `Pattern` (later range-annotated by the
//! optimizer) and the variable positions become a position→variable map.
//!
//! All shape and ordering errors are raised here, before any execution:
//! the first stage must be a BGP, filters and projections must follow a
//! bindings-producing stage, construct is terminal, and every referenced
//! variable must already be bound by an earlier stage.

use crate::error::{Result, SearchError};
use crate::stage::{FilterOp, QuadPattern, SearchStage};
use quadkv_core::{Pattern, Term, TermName, TermOrRange};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A parsed BGP stage: bound-term pattern plus position→variable map
#[derive(Clone, Debug)]
pub(crate) struct ParsedBgp {
    /// Bound positions (terms and, after optimization, ranges)
    pub pattern: Pattern,
    /// Variable positions in (s, p, o, g) order
    pub var_positions: Vec<(TermName, Arc<str>)>,
    /// Free variables of this stage
    pub variables: FxHashSet<Arc<str>>,
}

/// One operand of a parsed filter
#[derive(Clone, Debug)]
pub(crate) enum FilterArg {
    /// A variable resolved against each binding
    Variable(Arc<str>),
    /// A constant term
    Constant(Term),
}

/// A parsed filter stage
#[derive(Clone, Debug)]
pub(crate) struct ParsedFilter {
    pub op: FilterOp,
    pub args: Vec<FilterArg>,
    /// Variables referenced by the filter
    pub variables: FxHashSet<Arc<str>>,
}

/// A parsed, validated pipeline stage
#[derive(Clone, Debug)]
pub(crate) enum ParsedStage {
    Bgp(ParsedBgp),
    Filter(ParsedFilter),
    Project {
        /// Retained variables; `None` means `*` (pass through unchanged)
        variables: Option<Vec<Arc<str>>>,
    },
    Construct {
        patterns: Vec<QuadPattern>,
    },
}

/// Parse and validate a raw stage pipeline
pub(crate) fn parse(stages: &[SearchStage]) -> Result<Vec<ParsedStage>> {
    if stages.is_empty() {
        return Err(SearchError::invalid_pipeline("pipeline must not be empty"));
    }
    if !matches!(stages[0], SearchStage::Bgp { .. }) {
        return Err(SearchError::invalid_pipeline(
            "the first stage must be a bgp",
        ));
    }

    let mut parsed = Vec::with_capacity(stages.len());
    let mut bound: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut projected = false;
    let mut constructed = false;

    for stage in stages {
        if constructed {
            return Err(SearchError::unsupported_stage(
                "no stage may follow a construct",
            ));
        }
        match stage {
            SearchStage::Bgp { pattern } => {
                if projected {
                    return Err(SearchError::unsupported_stage(
                        "a bgp may not follow a project",
                    ));
                }
                let bgp = parse_bgp(pattern)?;
                bound.extend(bgp.variables.iter().cloned());
                parsed.push(ParsedStage::Bgp(bgp));
            }
            SearchStage::Filter { op, args } => {
                let filter = parse_filter(*op, args, &bound)?;
                parsed.push(ParsedStage::Filter(filter));
            }
            SearchStage::Project { variables } => {
                let variables = parse_project(variables, &bound)?;
                if let Some(retained) = &variables {
                    bound = retained.iter().cloned().collect();
                }
                projected = true;
                parsed.push(ParsedStage::Project { variables });
            }
            SearchStage::Construct { patterns } => {
                parse_construct(patterns, &bound)?;
                constructed = true;
                parsed.push(ParsedStage::Construct {
                    patterns: patterns.clone(),
                });
            }
        }
    }
    Ok(parsed)
}

fn parse_bgp(quad_pattern: &QuadPattern) -> Result<ParsedBgp> {
    let mut pattern = Pattern::new();
    let mut var_positions = Vec::new();
    let mut variables = FxHashSet::default();

    for (name, term) in quad_pattern.terms() {
        match term {
            Term::Variable { name: var } => {
                let var: Arc<str> = Arc::from(var.as_str());
                var_positions.push((name, Arc::clone(&var)));
                variables.insert(var);
            }
            concrete => {
                *pattern.get_mut(name) = Some(TermOrRange::Term(concrete.clone()));
            }
        }
    }
    // Position restrictions on the bound terms surface now, not at scan time.
    pattern.validate()?;
    Ok(ParsedBgp {
        pattern,
        var_positions,
        variables,
    })
}

fn parse_filter(
    op: FilterOp,
    args: &[Term],
    bound: &FxHashSet<Arc<str>>,
) -> Result<ParsedFilter> {
    if args.len() != 2 {
        return Err(SearchError::invalid_pipeline(format!(
            "filter takes exactly two operands, got {}",
            args.len()
        )));
    }
    let mut parsed_args = Vec::with_capacity(args.len());
    let mut variables = FxHashSet::default();
    for arg in args {
        match arg {
            Term::Variable { name } => {
                let var: Arc<str> = Arc::from(name.as_str());
                if !bound.contains(&var) {
                    return Err(SearchError::UnknownVariable(name.clone()));
                }
                variables.insert(Arc::clone(&var));
                parsed_args.push(FilterArg::Variable(var));
            }
            constant => parsed_args.push(FilterArg::Constant(constant.clone())),
        }
    }
    if variables.is_empty() {
        return Err(SearchError::invalid_pipeline(
            "filter must reference at least one variable",
        ));
    }
    Ok(ParsedFilter {
        op,
        args: parsed_args,
        variables,
    })
}

fn parse_project(
    variables: &[String],
    bound: &FxHashSet<Arc<str>>,
) -> Result<Option<Vec<Arc<str>>>> {
    if variables.iter().any(|v| v == "*") {
        if variables.len() != 1 {
            return Err(SearchError::invalid_pipeline(
                "`*` cannot be combined with named variables",
            ));
        }
        return Ok(None);
    }
    if variables.is_empty() {
        return Err(SearchError::invalid_pipeline(
            "project requires at least one variable or `*`",
        ));
    }
    let mut retained = Vec::with_capacity(variables.len());
    for name in variables {
        let var: Arc<str> = Arc::from(name.as_str());
        if !bound.contains(&var) {
            return Err(SearchError::UnknownVariable(name.clone()));
        }
        retained.push(var);
    }
    Ok(Some(retained))
}

fn parse_construct(patterns: &[QuadPattern], bound: &FxHashSet<Arc<str>>) -> Result<()> {
    if patterns.is_empty() {
        return Err(SearchError::invalid_pipeline(
            "construct requires at least one template",
        ));
    }
    for pattern in patterns {
        // Templates instantiate quads, so every position except the graph
        // (which defaults to the default graph) must carry a term.
        for name in [TermName::Subject, TermName::Predicate, TermName::Object] {
            if pattern.get(name).is_none() {
                return Err(SearchError::invalid_pipeline(format!(
                    "construct template is missing its {name} term"
                )));
            }
        }
        for (_, term) in pattern.terms() {
            if let Term::Variable { name } = term {
                if !bound.contains(name.as_str()) {
                    return Err(SearchError::UnknownVariable(name.clone()));
                }
            }
        }
    }
    Ok(())
}
