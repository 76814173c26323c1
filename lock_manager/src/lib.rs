//! Transactional lock manager: shared/exclusive locks over logical entity
//! ids, strict two-phase locking, and eager deadlock detection via a
//! wait-for graph.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::clone_on_ref_ptr
)]

mod error;
mod graph;
mod manager;
mod mode;

pub use error::{Error, Result};
pub use manager::LockManager;
pub use mode::LockMode;
