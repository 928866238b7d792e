//! Search stage descriptors
//!
//! A search is an ordered pipeline of stage descriptors, typically produced
//! by an external SPARQL-to-stages translator. Stages are closed tagged
//! variants; the parser validates their order and shapes before execution.

use quadkv_core::{Term, TermName};

/// Comparison and prefix operators for filter stages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// Strictly less than, in codec order
    Lt,
    /// Less than or equal, in codec order
    Lte,
    /// Strictly greater than, in codec order
    Gt,
    /// Greater than or equal, in codec order
    Gte,
    /// Exactly equal
    Eq,
    /// Not equal
    Neq,
    /// Encoded-byte prefix match
    StartsWith,
    /// Negated encoded-byte prefix match
    StartsWithout,
}

impl FilterOp {
    /// True for the four operators the optimizer can turn into range bounds
    pub fn is_comparison(self) -> bool {
        matches!(self, FilterOp::Lt | FilterOp::Lte | FilterOp::Gt | FilterOp::Gte)
    }
}

/// A quad pattern with variables
///
/// Each position holds a term, a variable, or nothing. An absent position
/// is an unbound wildcard: it matches anything and binds no variable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadPattern {
    /// Subject term or variable
    pub subject: Option<Term>,
    /// Predicate term or variable
    pub predicate: Option<Term>,
    /// Object term or variable
    pub object: Option<Term>,
    /// Graph term or variable
    pub graph: Option<Term>,
}

impl QuadPattern {
    /// Create a pattern with subject, predicate and object set
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        QuadPattern {
            subject: Some(subject),
            predicate: Some(predicate),
            object: Some(object),
            graph: None,
        }
    }

    /// Create a fully wildcarded pattern
    pub fn any() -> Self {
        Self::default()
    }

    /// Set the subject position
    pub fn with_subject(mut self, subject: Term) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Set the predicate position
    pub fn with_predicate(mut self, predicate: Term) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Set the object position
    pub fn with_object(mut self, object: Term) -> Self {
        self.object = Some(object);
        self
    }

    /// Set the graph position
    pub fn with_graph(mut self, graph: Term) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Access a position
    pub fn get(&self, name: TermName) -> Option<&Term> {
        match name {
            TermName::Subject => self.subject.as_ref(),
            TermName::Predicate => self.predicate.as_ref(),
            TermName::Object => self.object.as_ref(),
            TermName::Graph => self.graph.as_ref(),
        }
    }

    /// Iterate over the present (position, term) pairs
    pub fn terms(&self) -> impl Iterator<Item = (TermName, &Term)> {
        [
            (TermName::Subject, self.subject.as_ref()),
            (TermName::Predicate, self.predicate.as_ref()),
            (TermName::Object, self.object.as_ref()),
            (TermName::Graph, self.graph.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, term)| term.map(|t| (name, t)))
    }
}

/// One stage of a search pipeline
#[derive(Clone, Debug, PartialEq)]
pub enum SearchStage {
    /// Basic graph pattern match
    Bgp {
        /// The pattern to match
        pattern: QuadPattern,
    },
    /// Predicate over the current bindings
    Filter {
        /// The operator
        op: FilterOp,
        /// Operands: variables and constant terms
        args: Vec<Term>,
    },
    /// Restrict bindings to a variable list (`*` passes through unchanged)
    Project {
        /// Variable names to retain
        variables: Vec<String>,
    },
    /// Instantiate quad templates from each binding (terminal stage)
    Construct {
        /// Templates with free variables
        patterns: Vec<QuadPattern>,
    },
}
