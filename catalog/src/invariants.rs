//! Checks that a built snapshot satisfies every structural invariant the
//! catalog promises to hold after any committed change. The DDL orchestrator
//! calls these before publishing; a violation aborts the mutation with the
//! originating validate-phase error rather than ever becoming visible.

use catalog_types::{AllocationPlacement, EntityId, PlacementId, PlacementType};

use crate::error::{self, Result};
use crate::snapshot::Snapshot;

/// Every logical column of `entity` has at least one allocation column
/// across all its placements.
pub fn check_no_orphaned_columns(snapshot: &Snapshot, entity_id: EntityId) -> Result<()> {
    let placements = snapshot.placements_of(entity_id);
    for column in snapshot.columns_of_entity(entity_id) {
        let covered = placements.iter().any(|p| {
            snapshot
                .columns_of_placement(p.id)
                .iter()
                .any(|ac| ac.column_id == column.id)
        });
        if !covered {
            return error::OrphanedColumnSnafu {
                entity: entity_id,
                column: column.id,
            }
            .fail();
        }
    }
    Ok(())
}

/// Every partition id of `entity`'s partition property has at least one
/// allocation entity across all its placements.
pub fn check_no_orphaned_partitions(snapshot: &Snapshot, entity_id: EntityId) -> Result<()> {
    let Some(property) = snapshot.partition_property(entity_id) else {
        return Ok(());
    };
    let placements = snapshot.placements_of(entity_id);
    for partition_id in property.partition_ids() {
        let covered = placements
            .iter()
            .any(|p| snapshot.alloc_by_partition(p.id, partition_id).is_some());
        if !covered {
            return error::OrphanedPartitionSnafu {
                entity: entity_id,
                partition: partition_id,
            }
            .fail();
        }
    }
    Ok(())
}

/// Every placement of `entity` carries an allocation column for every
/// primary-key column.
pub fn check_pk_replicated_everywhere(snapshot: &Snapshot, entity_id: EntityId) -> Result<()> {
    let entity = snapshot.entity(entity_id)?;
    let Some(table) = entity.as_table() else {
        return Ok(());
    };
    for placement in snapshot.placements_of(entity_id) {
        let placement_columns = snapshot.columns_of_placement(placement.id);
        for pk_col in &table.primary_key.ordered_column_ids {
            let present = placement_columns.iter().any(|ac| ac.column_id == *pk_col);
            if !present {
                return error::MissingColumnPlacementSnafu {
                    placement: placement.id,
                    column: *pk_col,
                }
                .fail();
            }
        }
    }
    Ok(())
}

/// A placement whose partition set is empty is not a valid placement.
pub fn check_no_empty_placements(snapshot: &Snapshot, placement: &AllocationPlacement) -> Result<()> {
    if snapshot.allocs_of_placement(placement.id).is_empty() {
        return error::LastPlacementSnafu {
            entity: placement.logical_entity_id,
            placement: placement.id,
        }
        .fail();
    }
    Ok(())
}

/// The allocation type of a PK column's placement stays AUTOMATIC unless
/// explicitly overridden to MANUAL.
pub fn check_pk_placement_type(
    snapshot: &Snapshot,
    placement_id: PlacementId,
    allow_manual_override: bool,
) -> Result<()> {
    if allow_manual_override {
        return Ok(());
    }
    let placement = snapshot.placement(placement_id)?;
    let entity = snapshot.entity(placement.logical_entity_id)?;
    let Some(table) = entity.as_table() else {
        return Ok(());
    };
    if placement.placement_type == PlacementType::Manual && !table.primary_key.ordered_column_ids.is_empty() {
        return error::PlacementIsPrimarySnafu {
            placement: placement_id,
            column: table.primary_key.ordered_column_ids[0],
        }
        .fail();
    }
    Ok(())
}

/// Run the full set of structural checks relevant after a schema change to
/// `entity_id`. Called by the DDL orchestrator immediately before
/// publishing a new snapshot.
pub fn check_entity_invariants(snapshot: &Snapshot, entity_id: EntityId) -> Result<()> {
    check_no_orphaned_columns(snapshot, entity_id)?;
    check_no_orphaned_partitions(snapshot, entity_id)?;
    check_pk_replicated_everywhere(snapshot, entity_id)?;
    for placement in snapshot.placements_of(entity_id) {
        check_no_empty_placements(snapshot, placement)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SnapshotBuilder;
    use catalog_types::{
        AllocationColumn, AllocationEntity, AllocationPartition, LogicalColumn, LogicalEntity,
        LogicalEntityKind, NamespaceId, PartitionId, PartitionProperty, PlacementId, PolyType,
        PrimaryKey, Qualifier, Table,
    };

    fn simple_entity(entity_id: EntityId, column_id: catalog_types::ColumnId) -> LogicalEntity {
        LogicalEntity {
            id: entity_id,
            namespace_id: NamespaceId::new(1),
            name: "t".to_string(),
            kind: LogicalEntityKind::Table(Table {
                columns: vec![],
                primary_key: PrimaryKey { entity_id, ordered_column_ids: vec![column_id] },
                foreign_keys: vec![],
                unique_constraints: vec![],
                indexes: vec![],
                is_source: false,
                materialized_view: None,
            }),
        }
    }

    #[test]
    fn orphaned_column_is_rejected() {
        let entity_id = EntityId::new(1);
        let column_id = catalog_types::ColumnId::new(1);
        let mut b = SnapshotBuilder::from_snapshot(&Snapshot::default());
        b.insert_entity(simple_entity(entity_id, column_id));
        b.insert_column(LogicalColumn::new(column_id, entity_id, "k", 0, PolyType::Integer));
        let snapshot = b.build();

        assert!(check_no_orphaned_columns(&snapshot, entity_id).is_err());
    }

    #[test]
    fn fully_covered_column_passes() {
        let entity_id = EntityId::new(1);
        let column_id = catalog_types::ColumnId::new(1);
        let placement_id = PlacementId::new(1);
        let partition_id = PartitionId::new(1);

        let mut b = SnapshotBuilder::from_snapshot(&Snapshot::default());
        b.insert_entity(simple_entity(entity_id, column_id));
        b.insert_column(LogicalColumn::new(column_id, entity_id, "k", 0, PolyType::Integer));
        b.insert_placement(catalog_types::AllocationPlacement {
            id: placement_id,
            logical_entity_id: entity_id,
            adapter_id: catalog_types::AdapterId::new(1),
            placement_type: PlacementType::Automatic,
        });
        b.set_allocation_columns(
            placement_id,
            vec![AllocationColumn {
                placement_id,
                column_id,
                physical_name: None,
                physical_position: 0,
            }],
        );
        b.insert_partition(AllocationPartition {
            id: partition_id,
            group_id: catalog_types::PartitionGroupId::new(1),
            qualifiers: vec![Qualifier::Unbound],
            is_unbound: true,
        });
        b.insert_allocation_entity(AllocationEntity {
            placement_id,
            partition_id,
            adapter_physical_ref: "t_p1".to_string(),
        });
        b.set_partition_property(entity_id, PartitionProperty::None { partition_id });
        let snapshot = b.build();

        assert!(check_no_orphaned_columns(&snapshot, entity_id).is_ok());
        assert!(check_no_orphaned_partitions(&snapshot, entity_id).is_ok());
        assert!(check_pk_replicated_everywhere(&snapshot, entity_id).is_ok());
    }
}
