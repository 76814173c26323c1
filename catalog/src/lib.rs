//! The distribution catalog: copy-on-write snapshots of the logical +
//! allocation model, the adapter lifecycle contract, structural invariant
//! checks, and the versioned binary persistence format.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

pub mod adapter;
mod builder;
mod catalog;
pub mod error;
pub mod invariants;
pub mod persist;
mod snapshot;

pub use adapter::{Adapter, AdapterError, PhysicalScan, Row, RowStream, WriteBatch};
pub use builder::SnapshotBuilder;
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use snapshot::Snapshot;
