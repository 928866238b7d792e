//! Construction and query options
//!
//! Every recognized option is an explicit struct field with a documented
//! default; there are no open-ended option bags.

use crate::error::{Result, StoreError};
use crate::scope::Scope;
use quadkv_core::{default_indexes, Index, TermName};

/// Default key separator: sorts below every byte of an encoded term
pub const DEFAULT_SEPARATOR: u8 = 0x00;

/// Default upper-bound sentinel: sorts above every byte of an encoded term
pub const DEFAULT_BOUNDARY: u8 = 0xFF;

/// Store construction options
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Index set; fixed for the lifetime of the store
    pub indexes: Vec<Index>,
    /// Byte written between key components
    pub separator: u8,
    /// Byte appended to form exclusive upper scan bounds
    pub boundary: u8,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            indexes: default_indexes(),
            separator: DEFAULT_SEPARATOR,
            boundary: DEFAULT_BOUNDARY,
        }
    }
}

impl StoreOptions {
    /// Create options with the six default indexes
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a custom index set (validated for coverage at open)
    pub fn with_indexes(mut self, indexes: Vec<Index>) -> Self {
        self.indexes = indexes;
        self
    }

    /// Override the key separator byte
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Override the upper-bound sentinel byte
    pub fn with_boundary(mut self, boundary: u8) -> Self {
        self.boundary = boundary;
        self
    }

    /// Check separator/boundary against the codec's byte ranges
    ///
    /// Range-scan bounds rely on the separator sorting below, and the
    /// boundary above, every byte that can occur inside an encoded term
    /// (0x01..=0xF4).
    pub fn validate(&self) -> Result<()> {
        if self.separator != 0x00 {
            return Err(StoreError::invalid_options(
                "separator must sort below every encoded-term byte (only 0x00 qualifies)",
            ));
        }
        if self.boundary < 0xF5 {
            return Err(StoreError::invalid_options(
                "boundary must sort above every encoded-term byte (0xF5..=0xFF)",
            ));
        }
        Ok(())
    }
}

/// Options for `get` and `get_stream`
#[derive(Clone, Debug, Default)]
pub struct GetOptions {
    /// Requested output order over term positions
    ///
    /// Always honored: if the chosen index cannot provide it, results are
    /// buffered and resorted in memory and the result reports `resorted`.
    pub order: Option<Vec<TermName>>,
    /// Return results in descending order
    pub reverse: bool,
    /// Maximum number of quads to return
    pub limit: Option<usize>,
    /// Number of matching quads to skip
    pub offset: Option<usize>,
}

impl GetOptions {
    /// Create default options (index order, no limits)
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an output order
    pub fn with_order(mut self, order: Vec<TermName>) -> Self {
        self.order = Some(order);
        self
    }

    /// Return results in descending order
    pub fn with_reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Set a result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` matches
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Check option well-formedness
    pub fn validate(&self) -> Result<()> {
        if let Some(order) = &self.order {
            let mut seen = [false; 4];
            for &name in order {
                let slot = &mut seen[name as usize];
                if *slot {
                    return Err(StoreError::invalid_options(format!(
                        "duplicate {name} in requested order"
                    )));
                }
                *slot = true;
            }
        }
        Ok(())
    }
}

/// Options for `put` and `multi_put`
#[derive(Default)]
pub struct PutOptions<'a> {
    /// Blank-node scope applied to the written quads
    pub scope: Option<&'a mut Scope>,
}

impl<'a> PutOptions<'a> {
    /// Create default options (no scope)
    pub fn new() -> Self {
        Self::default()
    }

    /// Remap blank-node labels through the given scope
    pub fn with_scope(mut self, scope: &'a mut Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}
