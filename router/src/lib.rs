//! Turns a logical plan's scans and DML statements into routed plans
//! against a catalog snapshot: which allocations to read from or write to,
//! and how their columns map back onto logical columns.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

mod dml;
mod error;
mod plan;
mod policy;
mod router;

pub use dml::route_rows;
pub use error::{Error, Result};
pub use plan::{
    AllocationScan, LogicalPlan, QueryInformation, RoutedPlan, RoutedRow, RoutedScan,
};
pub use policy::RouterPolicy;
pub use router::Router;
