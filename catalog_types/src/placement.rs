//! Allocation model: placements, allocation columns and allocation entities —
//! the layer that binds logical entities to physical adapters.

use crate::ids::{AdapterId, ColumnId, EntityId, PartitionId, PlacementId};

/// How a placement was brought into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementType {
    /// Chosen and maintained by the engine (the common case).
    Automatic,
    /// Explicitly requested by DDL and pinned there.
    Manual,
    /// A read-only placement exported by a SOURCE adapter.
    Static,
}

/// `{id, logicalEntityId, adapterId, placementType}` — the per-adapter home
/// of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlacement {
    pub id: PlacementId,
    pub logical_entity_id: EntityId,
    pub adapter_id: AdapterId,
    pub placement_type: PlacementType,
}

/// One logical column materialized on one placement.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationColumn {
    pub placement_id: PlacementId,
    pub column_id: ColumnId,
    pub physical_name: Option<String>,
    pub physical_position: i32,
}

/// The triple that is actually queried on an adapter: one partition of one
/// placement, with a handle the adapter understands.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntity {
    pub placement_id: PlacementId,
    pub partition_id: PartitionId,
    /// Opaque reference the adapter uses to locate its physical table
    /// (schema-qualified name, file path, collection name, ...).
    pub adapter_physical_ref: String,
}
