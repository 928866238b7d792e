//! Blank-node scopes
//!
//! A scope remaps blank-node labels to globally unique minted labels, so
//! repeated imports of the same logical document stay idempotent: the first
//! sight of each local label mints a fresh label, later sights reuse it,
//! and the mapping is persisted under a reserved key namespace so a scope
//! can be reloaded by id.
//!
//! Two scopes never share a minted label for the same original label, and
//! replaying a scope id reproduces its mapping deterministically from the
//! persisted records.

use quadkv_core::{BatchOp, Quad, Result, Term, TermName};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved key-namespace prefix for persisted scope records
///
/// Index names are always four characters, so the five-character prefix can
/// never collide with an index keyspace.
pub(crate) const SCOPE_NAMESPACE: &[u8] = b"SCOPE";

/// Persisted record for one remapped label
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScopeRecord {
    pub original_label: String,
    pub random_label: String,
}

/// A blank-node label namespace
#[derive(Debug)]
pub struct Scope {
    id: String,
    labels: FxHashMap<String, String>,
}

impl Scope {
    pub(crate) fn new(id: String) -> Self {
        Scope {
            id,
            labels: FxHashMap::default(),
        }
    }

    pub(crate) fn with_labels(id: String, labels: FxHashMap<String, String>) -> Self {
        Scope { id, labels }
    }

    /// The scope identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of labels remapped so far
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true when no labels have been remapped yet
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The minted label for an original label, if already seen
    pub fn minted_label(&self, original: &str) -> Option<&str> {
        self.labels.get(original).map(String::as_str)
    }

    /// Remap every blank node in a quad, appending persistence ops for
    /// labels minted by this call.
    pub(crate) fn map_quad(
        &mut self,
        quad: &Quad,
        separator: u8,
        batch: &mut Vec<BatchOp>,
    ) -> Result<Quad> {
        let mut mapped = quad.clone();
        for name in TermName::all() {
            let Term::BlankNode { label } = quad.term(name) else {
                continue;
            };
            let minted = match self.labels.get(label) {
                Some(minted) => minted.clone(),
                None => {
                    let minted = Uuid::new_v4().simple().to_string();
                    self.labels.insert(label.clone(), minted.clone());
                    let record = ScopeRecord {
                        original_label: label.clone(),
                        random_label: minted.clone(),
                    };
                    batch.push(BatchOp::Put {
                        key: record_key(&self.id, label, separator),
                        value: serde_json::to_vec(&record)?,
                    });
                    minted
                }
            };
            mapped = mapped.with_term(name, Term::blank_node(minted)?)?;
        }
        Ok(mapped)
    }
}

/// Key for one persisted scope record: `SCOPE<sep><id><sep><label>`
pub(crate) fn record_key(id: &str, original_label: &str, separator: u8) -> Vec<u8> {
    let mut key = namespace_prefix(separator);
    key.extend_from_slice(id.as_bytes());
    key.push(separator);
    key.extend_from_slice(original_label.as_bytes());
    key
}

/// Prefix covering every persisted scope record
pub(crate) fn namespace_prefix(separator: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(SCOPE_NAMESPACE.len() + 1);
    key.extend_from_slice(SCOPE_NAMESPACE);
    key.push(separator);
    key
}

/// Prefix covering one scope's persisted records
pub(crate) fn scope_prefix(id: &str, separator: u8) -> Vec<u8> {
    let mut key = namespace_prefix(separator);
    key.extend_from_slice(id.as_bytes());
    key.push(separator);
    key
}

/// Mint a fresh scope id
pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}
