//! The logical plan the router consumes and the routed plan it produces.
//!
//! Parsing, the full relational/document/graph algebra, and cost-based
//! rewrites are collaborators the router only talks to through these
//! shapes — a closed set of tagged variants rather than a trait object
//! hierarchy, the same choice `partition_fn::Strategy` makes for the same
//! reason: the set of node kinds is fixed and small.

use catalog_types::{ColumnId, EntityId, PartitionId, PlacementId};
use std::collections::BTreeSet;

/// A node of the logical plan the router rewrites. Only the shapes the
/// router itself inspects or rewrites are represented; everything else a
/// full algebra would carry (projections, filters, aggregates that don't
/// touch routing) is opaque to the router and left for the execution layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// A relational table scan.
    Scan { entity: EntityId },
    /// A non-scan relational operator wrapping one or more inputs — kept
    /// opaque to the router beyond routing its `Scan` children.
    Relational {
        op: &'static str,
        inputs: Vec<LogicalPlan>,
    },
    DocumentScan { entity: EntityId },
    DocumentModify { entity: EntityId },
    DocumentValues { entity: EntityId, rows: usize },
    LpgScan { entity: EntityId },
    LpgModify { entity: EntityId },
    LpgValues { entity: EntityId, rows: usize },
}

impl LogicalPlan {
    /// The entity a scan-shaped node targets, if any.
    pub fn scanned_entity(&self) -> Option<EntityId> {
        match self {
            LogicalPlan::Scan { entity }
            | LogicalPlan::DocumentScan { entity }
            | LogicalPlan::DocumentModify { entity }
            | LogicalPlan::DocumentValues { entity, .. }
            | LogicalPlan::LpgScan { entity }
            | LogicalPlan::LpgModify { entity }
            | LogicalPlan::LpgValues { entity, .. } => Some(*entity),
            LogicalPlan::Relational { .. } => None,
        }
    }
}

/// Predicate hints the caller extracts from the query before routing:
/// which logical columns are actually referenced, and whether an equality
/// or range filter pins the partition column to a known value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInformation {
    pub referenced_columns: BTreeSet<ColumnId>,
    /// `Some(value)` when the partition column is filtered by equality;
    /// canonical string form, the same representation `partition_fn::value`
    /// uses.
    pub partition_equality: Option<String>,
}

impl QueryInformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: ColumnId) -> Self {
        self.referenced_columns.insert(column);
        self
    }

    pub fn with_partition_equality(mut self, value: impl Into<String>) -> Self {
        self.partition_equality = Some(value.into());
        self
    }
}

/// One allocation a routed scan reads from: a placement's partition, with
/// the logical-to-physical column mapping needed at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationScan {
    pub placement_id: PlacementId,
    pub partition_id: PartitionId,
    /// logicalColumnId -> physical field index on this allocation, in the
    /// order the adapter should project them.
    pub column_mapping: Vec<(ColumnId, i32)>,
}

/// The rewritten form of one `Scan`: either a single allocation, or a set
/// of allocations unioned across partitions and/or joined on the primary
/// key when needed columns are split across placements.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedScan {
    Single(AllocationScan),
    /// Multiple partitions of the same placement set, combined with
    /// `UNION ALL`.
    UnionAll(Vec<AllocationScan>),
    /// Needed columns are split across placements for at least one
    /// partition: each inner group is unioned, then the groups are joined
    /// on the primary key.
    JoinOnPrimaryKey {
        primary_key: Vec<ColumnId>,
        sides: Vec<Vec<AllocationScan>>,
    },
}

/// The result of routing one `Scan` node.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPlan {
    pub entity: EntityId,
    pub scan: RoutedScan,
}

/// One row's worth of an INSERT/UPDATE/DELETE, destined for one allocation.
/// A row whose partition is covered by more than one placement (the entity
/// is replicated) produces one `RoutedRow` per covering placement, all
/// sharing the same `row_index` so a caller can still group them back by
/// source row.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedRow {
    pub placement_id: PlacementId,
    pub partition_id: PartitionId,
    pub row_index: usize,
}
