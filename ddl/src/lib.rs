//! Drives every structural (DDL) change to the catalog through one
//! validate/lock/publish/adapter-call/migrate/invalidate sequence.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

mod error;
mod orchestrator;
mod spec;

pub use error::{Error, Result};
pub use orchestrator::DdlOrchestrator;
pub use spec::{ColumnSpec, PartitionSpec};
