//! Shared data model for polydb's distribution catalog: namespaces, logical
//! entities, columns, keys, partition properties,
//! placements and allocations. Pure value types only — the catalog's
//! storage, invariant enforcement and snapshot publication live in the
//! `catalog` crate; partition-function *behavior* lives in `partition_fn`.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

pub mod adapter;
pub mod column;
pub mod entity;
pub mod ids;
pub mod keys;
pub mod placement;
pub mod partition;

pub use adapter::{AdapterDescriptor, DeployMode};
pub use column::{Collation, LogicalColumn, PolyType};
pub use entity::{
    Collection, Graph, LogicalEntity, LogicalEntityKind, MaterializedViewDef, Namespace,
    NamespaceKind, RefreshPolicy, Table,
};
pub use ids::{
    sequence_names, AdapterId, ColumnId, ConstraintId, EntityId, IndexId, NamespaceId,
    PartitionGroupId, PartitionId, PlacementId, SequenceStore, TransactionId,
};
pub use keys::{ForeignKey, Index, IndexMethod, PrimaryKey, ReferentialAction, UniqueConstraint};
pub use placement::{AllocationColumn, AllocationEntity, AllocationPlacement, PlacementType};
pub use partition::{AllocationPartition, PartitionProperty, Qualifier, TemperatureConfig};
