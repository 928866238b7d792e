//! quadkv-store: the multi-index quad storage engine
//!
//! [`QuadStore`] owns an ordered key-value [`Backend`](quadkv_core::Backend)
//! and maintains one redundant ordering of the quad set per declared index,
//! so arbitrary term patterns are answered by range scans. Mutations fan
//! out to one key per index and apply as single atomic batches; blank-node
//! [`Scope`]s keep repeated imports collision-free.

mod error;
mod options;
mod scan;
mod scope;
mod store;

pub use error::{Result, StoreError};
pub use options::{GetOptions, PutOptions, StoreOptions, DEFAULT_BOUNDARY, DEFAULT_SEPARATOR};
pub use scope::Scope;
pub use store::{QuadResult, QuadStore, QuadStream, QuadStreamResult};
