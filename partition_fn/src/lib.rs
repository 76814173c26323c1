//! Partition functions: HASH, LIST, RANGE and the TEMPERATURE wrapper over
//! them, plus the greedy placement-cover search used by the router to pick
//! which adapters to read from for a partition.
//!
//! This crate is pure strategy code: it never touches the catalog directly,
//! only the [`catalog_types`] value types the catalog hands it.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

pub mod error;
pub mod function;
pub mod placements;
pub mod registry;
pub mod strategy;
pub mod temperature;
pub mod value;

pub use error::{Error, Result};
pub use function::{
    validate_list_qualifiers, validate_range_qualifiers, HashPartitionFn, ListPartitionFn,
    PartitionFunction, RangePartitionFn,
};
pub use placements::{cover, single_placement_cover, Coverage, PlacementCandidate};
pub use registry::PartitionFunctionRegistry;
pub use strategy::{target, validate, Strategy};
pub use temperature::{AccessTracker, Reclassification};
