//! Bindings - variable-to-term assignments produced by BGP evaluation

use quadkv_core::Term;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One solution: a mapping from variable name to term
///
/// Keys are unique and insertion order is irrelevant; ordering guarantees
/// live in the operator-level `sorting` metadata instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Binding {
    values: FxHashMap<Arc<str>, Term>,
}

impl Binding {
    /// Create an empty binding
    pub fn new() -> Self {
        Self::default()
    }

    /// The term bound to a variable
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.values.get(variable)
    }

    /// True when the variable is bound
    pub fn contains(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    /// Bind a variable, returning the previous term if any
    pub fn set(&mut self, variable: Arc<str>, term: Term) -> Option<Term> {
        self.values.insert(variable, term)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over (variable, term) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Term)> {
        self.values.iter()
    }

    /// Merge with another binding; on key collision the right-hand value
    /// wins, consistent with left-to-right stage order.
    pub fn merged(&self, right: &Binding) -> Binding {
        let mut values = self.values.clone();
        for (variable, term) in &right.values {
            values.insert(Arc::clone(variable), term.clone());
        }
        Binding { values }
    }

    /// Keep only the given variables
    pub fn restricted(&self, variables: &[Arc<str>]) -> Binding {
        let values = variables
            .iter()
            .filter_map(|v| {
                self.values
                    .get(v)
                    .map(|term| (Arc::clone(v), term.clone()))
            })
            .collect();
        Binding { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(iri: &str) -> Term {
        Term::named_node(iri).unwrap()
    }

    #[test]
    fn test_merge_right_wins() {
        let mut left = Binding::new();
        left.set(Arc::from("?a"), term("left-a"));
        left.set(Arc::from("?b"), term("left-b"));
        let mut right = Binding::new();
        right.set(Arc::from("?b"), term("right-b"));
        right.set(Arc::from("?c"), term("right-c"));

        let merged = left.merged(&right);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("?a"), Some(&term("left-a")));
        assert_eq!(merged.get("?b"), Some(&term("right-b")));
        assert_eq!(merged.get("?c"), Some(&term("right-c")));
    }

    #[test]
    fn test_restricted() {
        let mut binding = Binding::new();
        binding.set(Arc::from("?a"), term("a"));
        binding.set(Arc::from("?b"), term("b"));

        let projected = binding.restricted(&[Arc::from("?b"), Arc::from("?missing")]);
        assert_eq!(projected.len(), 1);
        assert!(projected.contains("?b"));
    }
}
