//! Index permutations over quad terms
//!
//! An index is a named, ordered 4-permutation of the quad term positions.
//! Each index defines a total order over quads and a composite-key layout:
//! `<name><SEP><encodedTerm><SEP>` for each term in index order. The store
//! keeps one entry per (quad, index), so any pattern of bound positions can
//! be answered by a prefix range scan on a suitable index.
//!
//! | Index | Order | Example use |
//! |-------|------------|--------------------------------|
//! | SPOG  | s, p, o, g | subject lookups |
//! | POGS  | p, o, g, s | property value lookups |
//! | OGSP  | o, g, s, p | reverse (object) traversal |
//! | GSPO  | g, s, p, o | per-graph subject lookups |
//! | OSPG  | o, s, p, g | object-subject joins |
//! | GPOS  | g, p, o, s | per-graph property lookups |
//!
//! The six defaults cover every 1-, 2- and 3-position bound pattern as a
//! scan prefix; user-declared sets are validated for the same property.

use crate::codec::write_term;
use crate::error::{Error, Result};
use crate::quad::Quad;
use crate::term::TermName;
use std::fmt;

/// A named total ordering of quads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    name: String,
    terms: [TermName; 4],
}

impl Index {
    /// Create an index from an ordered term permutation
    ///
    /// The name is derived from the term initials (e.g. `SPOG`).
    pub fn new(terms: [TermName; 4]) -> Result<Self> {
        for name in TermName::all() {
            if !terms.contains(&name) {
                return Err(Error::invalid_index(format!(
                    "index order must be a permutation of all four positions, missing {name}"
                )));
            }
        }
        let name = terms.iter().map(|t| t.initial()).collect();
        Ok(Index { name, terms })
    }

    /// The index name (term initials)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The term order
    pub fn terms(&self) -> &[TermName; 4] {
        &self.terms
    }

    /// Key prefix shared by every entry of this index
    pub fn key_prefix(&self, separator: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + 1);
        out.extend_from_slice(self.name.as_bytes());
        out.push(separator);
        out
    }

    /// Build the composite key for a quad under this index
    pub fn key(&self, quad: &Quad, separator: u8) -> Result<Vec<u8>> {
        let mut out = self.key_prefix(separator);
        for name in self.terms {
            write_term(quad.term(name), &mut out)?;
            out.push(separator);
        }
        Ok(out)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The six canonical index rotations
pub fn default_indexes() -> Vec<Index> {
    use TermName::{Graph as G, Object as O, Predicate as P, Subject as S};
    [
        [S, P, O, G],
        [P, O, G, S],
        [O, G, S, P],
        [G, S, P, O],
        [O, S, P, G],
        [G, P, O, S],
    ]
    .into_iter()
    .map(|terms| Index::new(terms).expect("canonical permutations are valid"))
    .collect()
}

/// Validate that an index set covers every bound-position combination
///
/// Every 1-, 2- and 3-element subset of the term positions must appear as a
/// leading prefix (as a set) of at least one index, so any pattern of bound
/// terms can be answered by a range scan instead of a full sweep.
pub fn validate_coverage(indexes: &[Index]) -> Result<()> {
    if indexes.is_empty() {
        return Err(Error::invalid_index("index set must not be empty"));
    }
    let mut names = std::collections::HashSet::new();
    for index in indexes {
        if !names.insert(index.name()) {
            return Err(Error::invalid_index(format!(
                "duplicate index {}",
                index.name()
            )));
        }
    }

    let position_bit = |name: TermName| -> u8 {
        match name {
            TermName::Subject => 1,
            TermName::Predicate => 2,
            TermName::Object => 4,
            TermName::Graph => 8,
        }
    };

    let mut covered = [false; 16];
    for index in indexes {
        let mut mask = 0u8;
        for &name in index.terms().iter().take(3) {
            mask |= position_bit(name);
            covered[mask as usize] = true;
        }
    }
    for mask in 1u8..15 {
        if !covered[mask as usize] {
            let missing: Vec<String> = TermName::all()
                .into_iter()
                .filter(|&n| mask & position_bit(n) != 0)
                .map(|n| n.to_string())
                .collect();
            return Err(Error::invalid_index(format!(
                "no index answers patterns binding {{{}}} as a scan prefix",
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    #[test]
    fn test_default_indexes_cover_all_patterns() {
        let indexes = default_indexes();
        assert_eq!(indexes.len(), 6);
        validate_coverage(&indexes).unwrap();
    }

    #[test]
    fn test_partial_set_fails_coverage() {
        let indexes = default_indexes();
        assert!(validate_coverage(&indexes[..2]).is_err());
    }

    #[test]
    fn test_names_from_initials() {
        let indexes = default_indexes();
        let names: Vec<&str> = indexes.iter().map(|i| i.name()).collect();
        assert_eq!(names, ["SPOG", "POGS", "OGSP", "GSPO", "OSPG", "GPOS"]);
    }

    #[test]
    fn test_key_layout() {
        use TermName::{Graph, Object, Predicate, Subject};
        let index = Index::new([Subject, Predicate, Object, Graph]).unwrap();
        let quad = Quad::triple(
            Term::named_node("s").unwrap(),
            Term::named_node("p").unwrap(),
            Term::literal("o").unwrap(),
        )
        .unwrap();
        let key = index.key(&quad, 0x00).unwrap();
        assert!(key.starts_with(b"SPOG\x00"));
        assert_eq!(key.iter().filter(|&&b| b == 0x00).count(), 5);
        assert_eq!(key.last(), Some(&0x00));
    }

    #[test]
    fn test_key_order_follows_index_order() {
        use TermName::{Graph, Object, Predicate, Subject};
        let index = Index::new([Object, Graph, Subject, Predicate]).unwrap();
        let a = Quad::triple(
            Term::named_node("s2").unwrap(),
            Term::named_node("p").unwrap(),
            Term::literal("a").unwrap(),
        )
        .unwrap();
        let b = Quad::triple(
            Term::named_node("s1").unwrap(),
            Term::named_node("p").unwrap(),
            Term::literal("b").unwrap(),
        )
        .unwrap();
        // OGSP orders by object first, so "a" sorts before "b" despite s2 > s1.
        assert!(index.key(&a, 0x00).unwrap() < index.key(&b, 0x00).unwrap());
    }
}
