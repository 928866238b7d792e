//! Quad - the atomic unit of stored data
//!
//! A quad is four terms: subject, predicate, object, graph. Subject,
//! predicate and graph are restricted to non-literal terms; the graph may be
//! the default-graph marker. Variables never appear in stored quads.

use crate::error::{Error, Result};
use crate::term::{Term, TermName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subject/predicate/object/graph tuple
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    /// Subject term (named or blank node)
    pub subject: Term,
    /// Predicate term (named node)
    pub predicate: Term,
    /// Object term (any non-variable term except the default-graph marker)
    pub object: Term,
    /// Graph term (named node, blank node, or the default graph)
    pub graph: Term,
}

impl Quad {
    /// Create a validated quad
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Result<Self> {
        let quad = Quad {
            subject,
            predicate,
            object,
            graph,
        };
        quad.validate()?;
        Ok(quad)
    }

    /// Create a quad in the default graph
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Result<Self> {
        Self::new(subject, predicate, object, Term::DefaultGraph)
    }

    /// Check the per-position term restrictions
    pub fn validate(&self) -> Result<()> {
        for name in TermName::all() {
            let term = self.term(name);
            if term.is_variable() {
                return Err(Error::validation(format!(
                    "variable {term} is not allowed in a stored quad"
                )));
            }
        }
        match &self.subject {
            Term::NamedNode { .. } | Term::BlankNode { .. } => {}
            other => {
                return Err(Error::validation(format!(
                    "invalid subject term: {other}"
                )))
            }
        }
        match &self.predicate {
            Term::NamedNode { .. } => {}
            other => {
                return Err(Error::validation(format!(
                    "invalid predicate term: {other}"
                )))
            }
        }
        match &self.object {
            Term::NamedNode { .. } | Term::BlankNode { .. } | Term::Literal { .. } => {}
            other => {
                return Err(Error::validation(format!("invalid object term: {other}")))
            }
        }
        match &self.graph {
            Term::NamedNode { .. } | Term::BlankNode { .. } | Term::DefaultGraph => {}
            other => {
                return Err(Error::validation(format!("invalid graph term: {other}")))
            }
        }
        Ok(())
    }

    /// Access a term by position
    pub fn term(&self, name: TermName) -> &Term {
        match name {
            TermName::Subject => &self.subject,
            TermName::Predicate => &self.predicate,
            TermName::Object => &self.object,
            TermName::Graph => &self.graph,
        }
    }

    /// Replace a term by position, revalidating the quad
    pub fn with_term(mut self, name: TermName, term: Term) -> Result<Self> {
        match name {
            TermName::Subject => self.subject = term,
            TermName::Predicate => self.predicate = term,
            TermName::Object => self.object = term,
            TermName::Graph => self.graph = term,
        }
        self.validate()?;
        Ok(self)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nn(iri: &str) -> Term {
        Term::named_node(iri).unwrap()
    }

    #[test]
    fn test_position_restrictions() {
        let lit = Term::literal("x").unwrap();

        assert!(Quad::triple(nn("s"), nn("p"), lit.clone()).is_ok());
        assert!(Quad::triple(lit.clone(), nn("p"), nn("o")).is_err());
        assert!(Quad::triple(nn("s"), lit.clone(), nn("o")).is_err());
        assert!(Quad::new(nn("s"), nn("p"), nn("o"), lit).is_err());
        assert!(Quad::triple(nn("s"), nn("p"), Term::DefaultGraph).is_err());
    }

    #[test]
    fn test_variables_rejected() {
        let var = Term::variable("?s").unwrap();
        assert!(Quad::triple(var, nn("p"), nn("o")).is_err());
    }

    #[test]
    fn test_term_accessor() {
        let q = Quad::triple(nn("s"), nn("p"), nn("o")).unwrap();
        assert_eq!(q.term(TermName::Subject), &nn("s"));
        assert_eq!(q.term(TermName::Graph), &Term::DefaultGraph);
    }
}
