//! Order-preserving term codec
//!
//! Encodes terms into byte strings whose lexicographic order matches the
//! semantic term order, so index range scans answer ordered pattern queries
//! without decoding:
//!
//! 1. A leading kind discriminator byte gives every term kind (and every
//!    literal class) a disjoint byte range: default graph < named node <
//!    blank node < numeric literal < plain string < language-tagged string <
//!    other typed literal.
//! 2. Named nodes order by IRI, blank nodes by label, plain strings by
//!    lexical form.
//! 3. Numeric literals order by represented value through a 16-byte
//!    sign-and-magnitude key: the IEEE-754 bits are mapped monotonically
//!    (negative values have all bits inverted so larger magnitudes sort
//!    first below zero; non-negative values have the sign bit set) and the
//!    result is hex-expanded so the key never contains the separator or
//!    boundary bytes. The exact lexical form and datatype follow the key,
//!    so `"1.0"` and `"1.00"` round-trip distinctly.
//! 4. Non-numeric typed literals order by lexical form, then datatype, then
//!    language tag.
//!
//! Encoded terms never contain 0x00 (the key separator) or 0xFF (the
//! upper-bound sentinel): textual parts are validated NUL-free at term
//! construction and 0xFF cannot occur in UTF-8. The 0x01 byte separates
//! fields *within* one encoded term.
//!
//! `decode_term(encode_term(t)) == t` for every well-formed term; malformed
//! bytes produce a decode error, never a silently coerced term.

use crate::error::{Error, Result};
use crate::quad::Quad;
use crate::term::Term;
use crate::vocab::{is_numeric_datatype, rdf, xsd};
use std::cmp::Ordering;

/// Field separator inside one encoded term
pub const FIELD_SEPARATOR: u8 = 0x01;

const KIND_DEFAULT_GRAPH: u8 = b'0';
const KIND_NAMED_NODE: u8 = b'1';
const KIND_BLANK_NODE: u8 = b'2';
const KIND_NUMERIC_LITERAL: u8 = b'3';
const KIND_STRING_LITERAL: u8 = b'4';
const KIND_LANG_LITERAL: u8 = b'5';
const KIND_TYPED_LITERAL: u8 = b'6';

const NUMERIC_KEY_LEN: usize = 16;

/// Encode a term into its order-preserving byte representation
pub fn encode_term(term: &Term) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(16);
    write_term(term, &mut out)?;
    Ok(out)
}

/// Append the order-preserving encoding of a term to `out`
pub fn write_term(term: &Term, out: &mut Vec<u8>) -> Result<()> {
    match term {
        Term::DefaultGraph => out.push(KIND_DEFAULT_GRAPH),
        Term::NamedNode { iri } => {
            out.push(KIND_NAMED_NODE);
            out.extend_from_slice(iri.as_bytes());
        }
        Term::BlankNode { label } => {
            out.push(KIND_BLANK_NODE);
            out.extend_from_slice(label.as_bytes());
        }
        Term::Literal {
            lexical,
            datatype,
            language,
        } => match language {
            Some(lang) => {
                out.push(KIND_LANG_LITERAL);
                out.extend_from_slice(lexical.as_bytes());
                out.push(FIELD_SEPARATOR);
                out.extend_from_slice(lang.as_bytes());
            }
            None if datatype == xsd::STRING => {
                out.push(KIND_STRING_LITERAL);
                out.extend_from_slice(lexical.as_bytes());
            }
            None if is_numeric_datatype(datatype) => {
                let value = term.numeric_value().ok_or_else(|| {
                    Error::encode(format!(
                        "numeric literal {lexical:?} does not represent an ordered value"
                    ))
                })?;
                out.push(KIND_NUMERIC_LITERAL);
                push_numeric_key(value, out);
                out.extend_from_slice(lexical.as_bytes());
                out.push(FIELD_SEPARATOR);
                out.extend_from_slice(datatype.as_bytes());
            }
            None => {
                out.push(KIND_TYPED_LITERAL);
                out.extend_from_slice(lexical.as_bytes());
                out.push(FIELD_SEPARATOR);
                out.extend_from_slice(datatype.as_bytes());
            }
        },
        Term::Variable { name } => {
            return Err(Error::encode(format!(
                "variable {name} cannot be encoded for storage"
            )))
        }
    }
    Ok(())
}

/// Decode a term from its order-preserving byte representation
pub fn decode_term(bytes: &[u8]) -> Result<Term> {
    let (&kind, rest) = bytes
        .split_first()
        .ok_or_else(|| Error::decode("empty term encoding"))?;
    match kind {
        KIND_DEFAULT_GRAPH => {
            if rest.is_empty() {
                Ok(Term::DefaultGraph)
            } else {
                Err(Error::decode("trailing bytes after default-graph marker"))
            }
        }
        KIND_NAMED_NODE => Term::named_node(decode_utf8(rest)?).map_err(as_decode_error),
        KIND_BLANK_NODE => Term::blank_node(decode_utf8(rest)?).map_err(as_decode_error),
        KIND_STRING_LITERAL => Term::literal(decode_utf8(rest)?).map_err(as_decode_error),
        KIND_LANG_LITERAL => {
            let (lexical, lang) = split_last_field(rest)?;
            Term::lang_literal(decode_utf8(lexical)?, decode_utf8(lang)?)
                .map_err(as_decode_error)
        }
        KIND_TYPED_LITERAL => {
            let (lexical, datatype) = split_last_field(rest)?;
            let datatype = decode_utf8(datatype)?;
            if datatype == xsd::STRING
                || datatype == rdf::LANG_STRING
                || is_numeric_datatype(&datatype)
            {
                return Err(Error::decode(format!(
                    "datatype {datatype} stored under the wrong literal class"
                )));
            }
            Term::typed_literal(decode_utf8(lexical)?, datatype).map_err(as_decode_error)
        }
        KIND_NUMERIC_LITERAL => {
            if rest.len() < NUMERIC_KEY_LEN + 1 {
                return Err(Error::decode("truncated numeric literal encoding"));
            }
            let (key, tail) = rest.split_at(NUMERIC_KEY_LEN);
            let stored = parse_numeric_key(key)?;
            let (lexical, datatype) = split_last_field(tail)?;
            let datatype = decode_utf8(datatype)?;
            if !is_numeric_datatype(&datatype) {
                return Err(Error::decode(format!(
                    "datatype {datatype} stored under the numeric literal class"
                )));
            }
            let term =
                Term::typed_literal(decode_utf8(lexical)?, datatype).map_err(as_decode_error)?;
            let value = term
                .numeric_value()
                .ok_or_else(|| Error::decode("numeric literal lost its numeric view"))?;
            if monotone_bits(value) != stored {
                return Err(Error::decode(
                    "numeric sort key does not match the lexical form",
                ));
            }
            Ok(term)
        }
        other => Err(Error::decode(format!(
            "unknown term kind discriminator: 0x{other:02x}"
        ))),
    }
}

/// Compare two terms by their encoded byte order
pub fn compare_terms(a: &Term, b: &Term) -> Result<Ordering> {
    Ok(encode_term(a)?.cmp(&encode_term(b)?))
}

/// Encode a quad as a length-framed byte value
///
/// The framing is not order-sensitive; it is the stored *value* paired with
/// each index key, kept so matches decode without re-deriving term order.
pub fn encode_quad(quad: &Quad) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    for term in [&quad.subject, &quad.predicate, &quad.object, &quad.graph] {
        let encoded = encode_term(term)?;
        let len = u32::try_from(encoded.len())
            .map_err(|_| Error::encode("term encoding exceeds u32 framing"))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&encoded);
    }
    Ok(out)
}

/// Decode a quad from its length-framed byte value
pub fn decode_quad(bytes: &[u8]) -> Result<Quad> {
    let mut cursor = bytes;
    let mut terms = Vec::with_capacity(4);
    for _ in 0..4 {
        if cursor.len() < 4 {
            return Err(Error::decode("truncated quad frame header"));
        }
        let (header, rest) = cursor.split_at(4);
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if rest.len() < len {
            return Err(Error::decode("truncated quad frame body"));
        }
        let (body, rest) = rest.split_at(len);
        terms.push(decode_term(body)?);
        cursor = rest;
    }
    if !cursor.is_empty() {
        return Err(Error::decode("trailing bytes after quad frames"));
    }
    let graph = terms.pop().unwrap_or(Term::DefaultGraph);
    let object = terms.pop().unwrap_or(Term::DefaultGraph);
    let predicate = terms.pop().unwrap_or(Term::DefaultGraph);
    let subject = terms.pop().unwrap_or(Term::DefaultGraph);
    Quad::new(subject, predicate, object, graph).map_err(as_decode_error)
}

/// Map an f64 to a u64 whose unsigned order matches the numeric order.
///
/// Negatives invert every bit (larger magnitude sorts first below zero);
/// non-negatives set the sign bit, placing them above all negatives.
fn monotone_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

fn push_numeric_key(value: f64, out: &mut Vec<u8>) {
    let bits = monotone_bits(value);
    for shift in (0..NUMERIC_KEY_LEN).rev() {
        let nibble = ((bits >> (shift * 4)) & 0xF) as u8;
        out.push(match nibble {
            0..=9 => b'0' + nibble,
            _ => b'a' + nibble - 10,
        });
    }
}

fn parse_numeric_key(key: &[u8]) -> Result<u64> {
    let text = std::str::from_utf8(key)
        .map_err(|_| Error::decode("numeric sort key is not valid hex"))?;
    u64::from_str_radix(text, 16).map_err(|_| Error::decode("numeric sort key is not valid hex"))
}

fn as_decode_error(error: Error) -> Error {
    Error::decode(error.to_string())
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::decode("encoded term contains invalid UTF-8"))
}

fn split_last_field(bytes: &[u8]) -> Result<(&[u8], &[u8])> {
    let pos = bytes
        .iter()
        .rposition(|&b| b == FIELD_SEPARATOR)
        .ok_or_else(|| Error::decode("missing field separator in literal encoding"))?;
    Ok((&bytes[..pos], &bytes[pos + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::xsd;

    fn roundtrip(term: &Term) {
        let encoded = encode_term(term).unwrap();
        let decoded = decode_term(&encoded).unwrap();
        assert_eq!(&decoded, term);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        roundtrip(&Term::named_node("http://ex.org/s").unwrap());
        roundtrip(&Term::blank_node("b42").unwrap());
        roundtrip(&Term::literal("hello world").unwrap());
        roundtrip(&Term::lang_literal("bonjour", "fr-CA").unwrap());
        roundtrip(&Term::typed_literal("2024-01-01", "http://www.w3.org/2001/XMLSchema#date").unwrap());
        roundtrip(&Term::typed_literal("42", xsd::INTEGER).unwrap());
        roundtrip(&Term::typed_literal("-0.5", xsd::DECIMAL).unwrap());
        roundtrip(&Term::DefaultGraph);
    }

    #[test]
    fn test_roundtrip_long_literal() {
        // Encodings far beyond typical key-prefix sizes must not truncate.
        let long = "x".repeat(100_000);
        roundtrip(&Term::literal(long).unwrap());
    }

    #[test]
    fn test_roundtrip_preserves_lexical_form() {
        let a = Term::typed_literal("1.0", xsd::DECIMAL).unwrap();
        let b = Term::typed_literal("1.00", xsd::DECIMAL).unwrap();
        let da = decode_term(&encode_term(&a).unwrap()).unwrap();
        let db = decode_term(&encode_term(&b).unwrap()).unwrap();
        assert_eq!(da.lexical(), Some("1.0"));
        assert_eq!(db.lexical(), Some("1.00"));
    }

    #[test]
    fn test_variable_refuses_to_encode() {
        assert!(encode_term(&Term::variable("?s").unwrap()).is_err());
    }

    #[test]
    fn test_numeric_order_matches_value_order() {
        let values = [
            ("-INF", xsd::DOUBLE),
            ("-1000000", xsd::INTEGER),
            ("-1.5", xsd::DECIMAL),
            ("-1", xsd::INTEGER),
            ("-0.25", xsd::DOUBLE),
            ("0", xsd::INTEGER),
            ("0.25", xsd::DECIMAL),
            ("3", xsd::INTEGER),
            ("3.5", xsd::DOUBLE),
            ("4", xsd::LONG),
            ("1e12", xsd::DOUBLE),
            ("INF", xsd::DOUBLE),
        ];
        let encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|(lex, dt)| encode_term(&Term::typed_literal(*lex, *dt).unwrap()).unwrap())
            .collect();
        for window in encoded.windows(2) {
            assert!(window[0] < window[1], "numeric encodings out of order");
        }
    }

    #[test]
    fn test_string_order_matches_lexical_order() {
        let values = ["", "a", "ab", "b", "ba"];
        let encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|lex| encode_term(&Term::literal(*lex).unwrap()).unwrap())
            .collect();
        for window in encoded.windows(2) {
            assert!(window[0] < window[1], "string encodings out of order");
        }
    }

    #[test]
    fn test_literal_classes_do_not_interleave() {
        let numeric = encode_term(&Term::typed_literal("999999", xsd::INTEGER).unwrap()).unwrap();
        let plain = encode_term(&Term::literal("0").unwrap()).unwrap();
        let lang = encode_term(&Term::lang_literal("0", "en").unwrap()).unwrap();
        let typed =
            encode_term(&Term::typed_literal("0", "http://ex.org/dt").unwrap()).unwrap();
        assert!(numeric < plain);
        assert!(plain < lang);
        assert!(lang < typed);
    }

    #[test]
    fn test_typed_order_lexical_then_datatype() {
        let a = encode_term(&Term::typed_literal("a", "http://ex.org/dt2").unwrap()).unwrap();
        let b = encode_term(&Term::typed_literal("b", "http://ex.org/dt1").unwrap()).unwrap();
        assert!(a < b);

        let c = encode_term(&Term::typed_literal("a", "http://ex.org/dt1").unwrap()).unwrap();
        assert!(c < a);
    }

    #[test]
    fn test_no_reserved_bytes_in_encodings() {
        let terms = [
            Term::named_node("http://ex.org/s").unwrap(),
            Term::typed_literal("-42.5", xsd::DECIMAL).unwrap(),
            Term::lang_literal("héllo", "en").unwrap(),
        ];
        for term in &terms {
            let encoded = encode_term(term).unwrap();
            assert!(!encoded.contains(&0x00));
            assert!(!encoded.contains(&0xFF));
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_term(&[]).is_err());
        assert!(decode_term(&[b'z', b'x']).is_err());
        // Lang literal with no field separator
        assert!(decode_term(&[KIND_LANG_LITERAL, b'a', b'b']).is_err());
        // Numeric literal with a corrupted sort key
        let good = encode_term(&Term::typed_literal("7", xsd::INTEGER).unwrap()).unwrap();
        let mut bad = good.clone();
        bad[1] = b'0';
        bad[2] = b'0';
        assert!(decode_term(&bad).is_err());
        // Plain-string datatype smuggled into the typed class
        let mut smuggled = vec![KIND_TYPED_LITERAL];
        smuggled.extend_from_slice(b"x");
        smuggled.push(FIELD_SEPARATOR);
        smuggled.extend_from_slice(xsd::STRING.as_bytes());
        assert!(decode_term(&smuggled).is_err());
    }

    #[test]
    fn test_quad_roundtrip() {
        let quad = Quad::new(
            Term::named_node("http://ex.org/s").unwrap(),
            Term::named_node("http://ex.org/p").unwrap(),
            Term::typed_literal("12.5", xsd::DECIMAL).unwrap(),
            Term::named_node("http://ex.org/g").unwrap(),
        )
        .unwrap();
        let bytes = encode_quad(&quad).unwrap();
        assert_eq!(decode_quad(&bytes).unwrap(), quad);
    }

    #[test]
    fn test_quad_decode_rejects_truncation() {
        let quad = Quad::triple(
            Term::named_node("http://ex.org/s").unwrap(),
            Term::named_node("http://ex.org/p").unwrap(),
            Term::literal("o").unwrap(),
        )
        .unwrap();
        let bytes = encode_quad(&quad).unwrap();
        assert!(decode_quad(&bytes[..bytes.len() - 1]).is_err());
        assert!(decode_quad(&[]).is_err());
    }
}
