//! Pattern types for direct quad matching
//!
//! A `Pattern` is a partial quad: each position is absent (wildcard), a
//! concrete term, or a `TermRange` with inclusive/exclusive bounds compared
//! in encoded-byte order. Patterns drive both direct `get` calls and the
//! range-annotated patterns the optimizer produces from pushed-down filters.

use crate::codec::compare_terms;
use crate::error::{Error, Result};
use crate::quad::Quad;
use crate::term::{Term, TermName};
use std::cmp::Ordering;

/// Range constraint over one quad position
///
/// At most one lower (`gt` xor `gte`) and one upper (`lt` xor `lte`) bound
/// may be set. Bounds are compared by the term codec's byte order, which for
/// numeric literals is value order and for strings is lexical order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermRange {
    /// Exclusive lower bound
    pub gt: Option<Term>,
    /// Inclusive lower bound
    pub gte: Option<Term>,
    /// Exclusive upper bound
    pub lt: Option<Term>,
    /// Inclusive upper bound
    pub lte: Option<Term>,
}

impl TermRange {
    /// Create an empty (unconstrained) range
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an exclusive lower bound
    pub fn with_gt(mut self, term: Term) -> Self {
        self.gt = Some(term);
        self
    }

    /// Set an inclusive lower bound
    pub fn with_gte(mut self, term: Term) -> Self {
        self.gte = Some(term);
        self
    }

    /// Set an exclusive upper bound
    pub fn with_lt(mut self, term: Term) -> Self {
        self.lt = Some(term);
        self
    }

    /// Set an inclusive upper bound
    pub fn with_lte(mut self, term: Term) -> Self {
        self.lte = Some(term);
        self
    }

    /// Returns true if no bounds are set
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }

    /// Lower bound as (term, inclusive)
    pub fn lower(&self) -> Option<(&Term, bool)> {
        match (&self.gte, &self.gt) {
            (Some(t), _) => Some((t, true)),
            (None, Some(t)) => Some((t, false)),
            (None, None) => None,
        }
    }

    /// Upper bound as (term, inclusive)
    pub fn upper(&self) -> Option<(&Term, bool)> {
        match (&self.lte, &self.lt) {
            (Some(t), _) => Some((t, true)),
            (None, Some(t)) => Some((t, false)),
            (None, None) => None,
        }
    }

    /// Check bound well-formedness
    pub fn validate(&self) -> Result<()> {
        if self.gt.is_some() && self.gte.is_some() {
            return Err(Error::invalid_range("both gt and gte bounds set"));
        }
        if self.lt.is_some() && self.lte.is_some() {
            return Err(Error::invalid_range("both lt and lte bounds set"));
        }
        for bound in [&self.gt, &self.gte, &self.lt, &self.lte].into_iter().flatten() {
            if bound.is_variable() {
                return Err(Error::invalid_range(format!(
                    "range bound must be a concrete term, got {bound}"
                )));
            }
        }
        Ok(())
    }

    /// Check whether a term satisfies the bounds
    pub fn contains(&self, term: &Term) -> Result<bool> {
        if let Some((bound, inclusive)) = self.lower() {
            match compare_terms(term, bound)? {
                Ordering::Less => return Ok(false),
                Ordering::Equal if !inclusive => return Ok(false),
                _ => {}
            }
        }
        if let Some((bound, inclusive)) = self.upper() {
            match compare_terms(term, bound)? {
                Ordering::Greater => return Ok(false),
                Ordering::Equal if !inclusive => return Ok(false),
                _ => {}
            }
        }
        Ok(true)
    }

    /// Merge another range in, keeping the tightest bound on each side
    pub fn merge(&mut self, other: &TermRange) -> Result<()> {
        if let Some((term, inclusive)) = other.lower() {
            let replace = match self.lower() {
                None => true,
                Some((current, current_inclusive)) => match compare_terms(term, current)? {
                    Ordering::Greater => true,
                    Ordering::Equal => current_inclusive && !inclusive,
                    Ordering::Less => false,
                },
            };
            if replace {
                self.gt = None;
                self.gte = None;
                if inclusive {
                    self.gte = Some(term.clone());
                } else {
                    self.gt = Some(term.clone());
                }
            }
        }
        if let Some((term, inclusive)) = other.upper() {
            let replace = match self.upper() {
                None => true,
                Some((current, current_inclusive)) => match compare_terms(term, current)? {
                    Ordering::Less => true,
                    Ordering::Equal => current_inclusive && !inclusive,
                    Ordering::Greater => false,
                },
            };
            if replace {
                self.lt = None;
                self.lte = None;
                if inclusive {
                    self.lte = Some(term.clone());
                } else {
                    self.lt = Some(term.clone());
                }
            }
        }
        Ok(())
    }
}

/// One pattern position: a concrete term or a range
#[derive(Clone, Debug, PartialEq)]
pub enum TermOrRange {
    /// Match exactly this term
    Term(Term),
    /// Match terms within this range
    Range(TermRange),
}

impl From<Term> for TermOrRange {
    fn from(term: Term) -> Self {
        TermOrRange::Term(term)
    }
}

impl From<TermRange> for TermOrRange {
    fn from(range: TermRange) -> Self {
        TermOrRange::Range(range)
    }
}

/// A partial quad for direct matching
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pattern {
    /// Subject constraint
    pub subject: Option<TermOrRange>,
    /// Predicate constraint
    pub predicate: Option<TermOrRange>,
    /// Object constraint
    pub object: Option<TermOrRange>,
    /// Graph constraint
    pub graph: Option<TermOrRange>,
}

impl Pattern {
    /// Create an empty pattern (matches every quad)
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain the subject
    pub fn with_subject(mut self, constraint: impl Into<TermOrRange>) -> Self {
        self.subject = Some(constraint.into());
        self
    }

    /// Constrain the predicate
    pub fn with_predicate(mut self, constraint: impl Into<TermOrRange>) -> Self {
        self.predicate = Some(constraint.into());
        self
    }

    /// Constrain the object
    pub fn with_object(mut self, constraint: impl Into<TermOrRange>) -> Self {
        self.object = Some(constraint.into());
        self
    }

    /// Constrain the graph
    pub fn with_graph(mut self, constraint: impl Into<TermOrRange>) -> Self {
        self.graph = Some(constraint.into());
        self
    }

    /// Access the constraint at a position
    pub fn get(&self, name: TermName) -> Option<&TermOrRange> {
        match name {
            TermName::Subject => self.subject.as_ref(),
            TermName::Predicate => self.predicate.as_ref(),
            TermName::Object => self.object.as_ref(),
            TermName::Graph => self.graph.as_ref(),
        }
    }

    /// Mutable access to the constraint at a position
    pub fn get_mut(&mut self, name: TermName) -> &mut Option<TermOrRange> {
        match name {
            TermName::Subject => &mut self.subject,
            TermName::Predicate => &mut self.predicate,
            TermName::Object => &mut self.object,
            TermName::Graph => &mut self.graph,
        }
    }

    /// The concrete term at a position, if the constraint is a term
    pub fn term(&self, name: TermName) -> Option<&Term> {
        match self.get(name) {
            Some(TermOrRange::Term(term)) => Some(term),
            _ => None,
        }
    }

    /// The range at a position, if the constraint is a range
    pub fn range(&self, name: TermName) -> Option<&TermRange> {
        match self.get(name) {
            Some(TermOrRange::Range(range)) => Some(range),
            _ => None,
        }
    }

    /// Returns true if no position is constrained
    pub fn is_empty(&self) -> bool {
        TermName::all().iter().all(|&n| self.get(n).is_none())
    }

    /// Validate constraint shapes before any backend I/O
    pub fn validate(&self) -> Result<()> {
        for name in TermName::all() {
            match self.get(name) {
                None => {}
                Some(TermOrRange::Term(term)) => {
                    if term.is_variable() {
                        return Err(Error::validation(format!(
                            "variable {term} is not allowed in a direct pattern"
                        )));
                    }
                    let valid = match name {
                        TermName::Subject => {
                            matches!(term, Term::NamedNode { .. } | Term::BlankNode { .. })
                        }
                        TermName::Predicate => matches!(term, Term::NamedNode { .. }),
                        TermName::Object => !matches!(term, Term::DefaultGraph),
                        TermName::Graph => !term.is_literal(),
                    };
                    if !valid {
                        return Err(Error::validation(format!(
                            "term {term} is not valid in the {name} position"
                        )));
                    }
                }
                Some(TermOrRange::Range(range)) => range.validate()?,
            }
        }
        Ok(())
    }

    /// Check whether a quad satisfies every constraint
    pub fn matches(&self, quad: &Quad) -> Result<bool> {
        for name in TermName::all() {
            match self.get(name) {
                None => {}
                Some(TermOrRange::Term(term)) => {
                    if quad.term(name) != term {
                        return Ok(false);
                    }
                }
                Some(TermOrRange::Range(range)) => {
                    if !range.contains(quad.term(name))? {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::xsd;

    fn num(lex: &str) -> Term {
        Term::typed_literal(lex, xsd::INTEGER).unwrap()
    }

    #[test]
    fn test_range_contains() {
        let range = TermRange::new().with_gte(num("10")).with_lt(num("20"));
        assert!(!range.contains(&num("9")).unwrap());
        assert!(range.contains(&num("10")).unwrap());
        assert!(range.contains(&num("19")).unwrap());
        assert!(!range.contains(&num("20")).unwrap());
    }

    #[test]
    fn test_range_validate() {
        let both = TermRange::new().with_gt(num("1")).with_gte(num("2"));
        assert!(both.validate().is_err());
        let var = TermRange::new().with_lt(Term::variable("?x").unwrap());
        assert!(var.validate().is_err());
    }

    #[test]
    fn test_range_merge_takes_tightest() {
        let mut range = TermRange::new().with_gte(num("5")).with_lte(num("100"));
        range
            .merge(&TermRange::new().with_gt(num("10")).with_lte(num("50")))
            .unwrap();
        assert_eq!(range.gt, Some(num("10")));
        assert_eq!(range.gte, None);
        assert_eq!(range.lte, Some(num("50")));

        // A looser range changes nothing.
        range
            .merge(&TermRange::new().with_gte(num("0")).with_lte(num("90")))
            .unwrap();
        assert_eq!(range.gt, Some(num("10")));
        assert_eq!(range.lte, Some(num("50")));

        // Equal bound, stricter exclusivity wins.
        range.merge(&TermRange::new().with_lt(num("50"))).unwrap();
        assert_eq!(range.lte, None);
        assert_eq!(range.lt, Some(num("50")));
    }

    #[test]
    fn test_pattern_matches() {
        let s = Term::named_node("http://ex.org/s").unwrap();
        let p = Term::named_node("http://ex.org/p").unwrap();
        let quad = Quad::triple(s.clone(), p.clone(), num("15")).unwrap();

        let pattern = Pattern::new()
            .with_subject(s.clone())
            .with_object(TermRange::new().with_gt(num("10")));
        assert!(pattern.matches(&quad).unwrap());

        let miss = Pattern::new().with_object(TermRange::new().with_gt(num("15")));
        assert!(!miss.matches(&quad).unwrap());
    }

    #[test]
    fn test_pattern_validate_positions() {
        let lit = Term::literal("x").unwrap();
        assert!(Pattern::new().with_subject(lit.clone()).validate().is_err());
        assert!(Pattern::new().with_predicate(lit.clone()).validate().is_err());
        assert!(Pattern::new().with_graph(lit.clone()).validate().is_err());
        assert!(Pattern::new().with_object(lit).validate().is_ok());
        assert!(Pattern::new()
            .with_subject(Term::variable("?s").unwrap())
            .validate()
            .is_err());
    }
}
