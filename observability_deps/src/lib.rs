//! Observability ecosystem dependencies for polydb, to ensure consistent
//! versions and unified updates.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations)]

// export this crate's dependencies
pub use tracing;
