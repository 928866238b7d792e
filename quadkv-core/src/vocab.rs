//! Well-known RDF and XSD vocabulary IRIs

/// XSD datatype IRIs
pub mod xsd {
    /// xsd:string
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// xsd:boolean
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// xsd:integer
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// xsd:decimal
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    /// xsd:double
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// xsd:float
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    /// xsd:long
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    /// xsd:int
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    /// xsd:short
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";
    /// xsd:byte
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";
    /// xsd:nonNegativeInteger
    pub const NON_NEGATIVE_INTEGER: &str =
        "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    /// xsd:nonPositiveInteger
    pub const NON_POSITIVE_INTEGER: &str =
        "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
    /// xsd:negativeInteger
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";
    /// xsd:positiveInteger
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    /// xsd:unsignedLong
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";
    /// xsd:unsignedInt
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";
    /// xsd:unsignedShort
    pub const UNSIGNED_SHORT: &str = "http://www.w3.org/2001/XMLSchema#unsignedShort";
    /// xsd:unsignedByte
    pub const UNSIGNED_BYTE: &str = "http://www.w3.org/2001/XMLSchema#unsignedByte";
}

/// RDF vocabulary IRIs
pub mod rdf {
    /// rdf:langString
    pub const LANG_STRING: &str =
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    /// rdf:type
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// Check whether a datatype IRI belongs to the numeric class.
///
/// Numeric literals are ordered by represented value in the term codec,
/// regardless of which concrete numeric datatype they carry.
pub fn is_numeric_datatype(datatype: &str) -> bool {
    matches!(
        datatype,
        xsd::INTEGER
            | xsd::DECIMAL
            | xsd::DOUBLE
            | xsd::FLOAT
            | xsd::LONG
            | xsd::INT
            | xsd::SHORT
            | xsd::BYTE
            | xsd::NON_NEGATIVE_INTEGER
            | xsd::NON_POSITIVE_INTEGER
            | xsd::NEGATIVE_INTEGER
            | xsd::POSITIVE_INTEGER
            | xsd::UNSIGNED_LONG
            | xsd::UNSIGNED_INT
            | xsd::UNSIGNED_SHORT
            | xsd::UNSIGNED_BYTE
    )
}
