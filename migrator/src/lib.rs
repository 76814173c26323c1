//! Batched row movement between allocations, driven by the DDL orchestrator
//! whenever a structural change adds, drops, or repartitions a placement.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

mod batch;
mod error;
mod migrator;

pub use batch::{route_rows, DEFAULT_BATCH_SIZE};
pub use error::{Error, Result};
pub use migrator::DataMigrator;
