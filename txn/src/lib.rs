//! Per-transaction statement/participant bookkeeping and commit/rollback
//! coordination across adapters and the lock manager.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

mod coordinator;
mod error;

pub use coordinator::TransactionCoordinator;
pub use error::{Error, Result};
