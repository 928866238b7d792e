//! Term - one RDF value
//!
//! A `Term` is a closed tagged variant covering the five shapes quadkv
//! understands: IRIs, blank nodes, literals (plain, language-tagged or
//! datatyped), the default-graph marker, and search-only variables.
//!
//! ## Numeric view
//!
//! A literal whose datatype is a recognized numeric XSD type additionally
//! exposes a numeric view (`Term::numeric_value`). The view is used only by
//! the term codec to produce value-ordered keys; equality and round-tripping
//! always go through the exact lexical form.
//!
//! ## Validation
//!
//! Terms are validated at construction. Textual parts must not contain the
//! NUL (0x00) or SOH (0x01) control bytes, which are reserved for key
//! separators inside encoded entries.

use crate::error::{Error, Result};
use crate::vocab::{is_numeric_datatype, rdf, xsd};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One RDF value
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "termType", rename_all = "camelCase")]
pub enum Term {
    /// IRI reference
    NamedNode {
        /// The IRI
        iri: String,
    },
    /// Blank node with a store-local label
    BlankNode {
        /// The label, without the `_:` prefix
        label: String,
    },
    /// Literal value
    Literal {
        /// Exact lexical form
        lexical: String,
        /// Datatype IRI (xsd:string for plain literals)
        datatype: String,
        /// Language tag, present iff datatype is rdf:langString
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Marker for the default graph
    DefaultGraph,
    /// Named variable (search pipelines only, never stored)
    Variable {
        /// Variable name, e.g. `?s`
        name: String,
    },
}

impl Term {
    /// Create a named node
    pub fn named_node(iri: impl Into<String>) -> Result<Self> {
        let iri = iri.into();
        validate_text("IRI", &iri)?;
        Ok(Term::NamedNode { iri })
    }

    /// Create a blank node
    pub fn blank_node(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validate_text("blank node label", &label)?;
        Ok(Term::BlankNode { label })
    }

    /// Create a plain (xsd:string) literal
    pub fn literal(lexical: impl Into<String>) -> Result<Self> {
        Self::typed_literal(lexical, xsd::STRING)
    }

    /// Create a typed literal
    ///
    /// A numeric datatype requires the lexical form to parse as a number.
    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Result<Self> {
        let lexical = lexical.into();
        let datatype = datatype.into();
        validate_lexical(&lexical)?;
        validate_text("datatype IRI", &datatype)?;
        if datatype == rdf::LANG_STRING {
            return Err(Error::validation(
                "rdf:langString literals require a language tag",
            ));
        }
        let term = Term::Literal {
            lexical,
            datatype,
            language: None,
        };
        if term.is_numeric_literal() && term.numeric_value().is_none() {
            return Err(Error::validation(format!(
                "lexical form {:?} is not a valid value for its numeric datatype",
                term.lexical().unwrap_or_default()
            )));
        }
        Ok(term)
    }

    /// Create a language-tagged literal (datatype rdf:langString)
    pub fn lang_literal(lexical: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let lexical = lexical.into();
        let language = language.into();
        validate_lexical(&lexical)?;
        if language.is_empty()
            || !language
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(Error::validation(format!(
                "invalid language tag: {language:?}"
            )));
        }
        Ok(Term::Literal {
            lexical,
            datatype: rdf::LANG_STRING.to_string(),
            language: Some(language),
        })
    }

    /// Create a search variable
    pub fn variable(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_text("variable name", &name)?;
        Ok(Term::Variable { name })
    }

    /// The default-graph marker
    pub fn default_graph() -> Self {
        Term::DefaultGraph
    }

    /// Check if this term is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Check if this term is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode { .. })
    }

    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable { .. })
    }

    /// Check if this literal belongs to the numeric class
    pub fn is_numeric_literal(&self) -> bool {
        match self {
            Term::Literal { datatype, .. } => is_numeric_datatype(datatype),
            _ => false,
        }
    }

    /// The lexical form, for literals
    pub fn lexical(&self) -> Option<&str> {
        match self {
            Term::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }

    /// The variable name, for variables
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Term::Variable { name } => Some(name),
            _ => None,
        }
    }

    /// Numeric view of a numeric-class literal
    ///
    /// Returns `None` for non-numeric terms and for lexical forms that do
    /// not represent an ordered number (NaN is not ordered).
    pub fn numeric_value(&self) -> Option<f64> {
        let Term::Literal {
            lexical, datatype, ..
        } = self
        else {
            return None;
        };
        if !is_numeric_datatype(datatype) {
            return None;
        }
        let value = match lexical.as_str() {
            // XSD spellings for the special double values
            "INF" | "+INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            other => other.trim().parse::<f64>().ok()?,
        };
        if value.is_nan() {
            return None;
        }
        Some(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode { iri } => write!(f, "<{iri}>"),
            Term::BlankNode { label } => write!(f, "_:{label}"),
            Term::Literal {
                lexical,
                datatype,
                language,
            } => match language {
                Some(lang) => write!(f, "{lexical:?}@{lang}"),
                None if datatype == xsd::STRING => write!(f, "{lexical:?}"),
                None => write!(f, "{lexical:?}^^<{datatype}>"),
            },
            Term::DefaultGraph => write!(f, "DEFAULT_GRAPH"),
            Term::Variable { name } => write!(f, "{name}"),
        }
    }
}

/// Quad term positions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermName {
    /// Subject position
    Subject,
    /// Predicate position
    Predicate,
    /// Object position
    Object,
    /// Graph position
    Graph,
}

impl TermName {
    /// All positions in canonical (s, p, o, g) order
    pub fn all() -> [TermName; 4] {
        [
            TermName::Subject,
            TermName::Predicate,
            TermName::Object,
            TermName::Graph,
        ]
    }

    /// Single-letter initial used in index names
    pub fn initial(self) -> char {
        match self {
            TermName::Subject => 'S',
            TermName::Predicate => 'P',
            TermName::Object => 'O',
            TermName::Graph => 'G',
        }
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermName::Subject => "subject",
            TermName::Predicate => "predicate",
            TermName::Object => "object",
            TermName::Graph => "graph",
        };
        write!(f, "{name}")
    }
}

fn validate_text(what: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    if text.bytes().any(|b| b < 0x20) {
        return Err(Error::validation(format!(
            "{what} must not contain control characters: {text:?}"
        )));
    }
    Ok(())
}

fn validate_lexical(lexical: &str) -> Result<()> {
    // Lexical forms may contain arbitrary text (tabs, newlines) but the two
    // bytes reserved as key separators are never valid.
    if lexical.bytes().any(|b| b == 0x00 || b == 0x01) {
        return Err(Error::validation(
            "literal lexical form must not contain NUL or SOH bytes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_validate() {
        assert!(Term::named_node("http://ex.org/a").is_ok());
        assert!(Term::named_node("").is_err());
        assert!(Term::named_node("http://ex.org/\u{0}a").is_err());
        assert!(Term::blank_node("b1").is_ok());
        assert!(Term::literal("hello\nworld").is_ok());
        assert!(Term::literal("bad\u{0}").is_err());
        assert!(Term::lang_literal("bonjour", "fr").is_ok());
        assert!(Term::lang_literal("bonjour", "f r").is_err());
    }

    #[test]
    fn test_numeric_view() {
        let n = Term::typed_literal("42", xsd::INTEGER).unwrap();
        assert_eq!(n.numeric_value(), Some(42.0));

        let d = Term::typed_literal("-1.5e3", xsd::DOUBLE).unwrap();
        assert_eq!(d.numeric_value(), Some(-1500.0));

        let inf = Term::typed_literal("-INF", xsd::DOUBLE).unwrap();
        assert_eq!(inf.numeric_value(), Some(f64::NEG_INFINITY));

        let s = Term::literal("42").unwrap();
        assert_eq!(s.numeric_value(), None);
    }

    #[test]
    fn test_numeric_lexical_rejected() {
        assert!(Term::typed_literal("forty-two", xsd::INTEGER).is_err());
        assert!(Term::typed_literal("NaN", xsd::DOUBLE).is_err());
    }

    #[test]
    fn test_plain_literal_is_xsd_string() {
        let a = Term::literal("x").unwrap();
        let b = Term::typed_literal("x", xsd::STRING).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lang_string_requires_tag() {
        assert!(Term::typed_literal("x", crate::vocab::rdf::LANG_STRING).is_err());
    }
}
