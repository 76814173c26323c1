//! DML row splitting: each INSERT/UPDATE/DELETE row is routed to exactly
//! one partition via the entity's partition function, then fanned out to
//! every placement that covers that partition and carries the primary key,
//! so a replicated entity gets the write applied on every allocation that
//! needs it, and each adapter only ever receives rows belonging to its own
//! allocation.

use crate::error::{NoCoveringPlacementSnafu, NoPartitionsSnafu, Result};
use crate::plan::RoutedRow;
use catalog::Snapshot;
use catalog_types::{ColumnId, EntityId, PlacementId};
use snafu::OptionExt;
use std::collections::BTreeSet;

use crate::router::strategy_for_property;

/// Route a batch of rows for `entity`. `partition_value` extracts the
/// canonical partition-column value for one row by index; `row_count` is
/// the batch size.
pub fn route_rows(
    snapshot: &Snapshot,
    entity: EntityId,
    row_count: usize,
    partition_value: impl Fn(usize) -> Option<String>,
) -> Result<Vec<RoutedRow>> {
    let logical_entity = snapshot.entity(entity)?;
    let primary_key: BTreeSet<ColumnId> = logical_entity
        .as_table()
        .map(|t| t.primary_key.ordered_column_ids.iter().copied().collect())
        .unwrap_or_default();

    let property = snapshot
        .partition_property(entity)
        .context(NoPartitionsSnafu { entity })?;
    let strategy = strategy_for_property(property);
    let all_ids = property.partition_ids();
    let qualifier_rows: Vec<_> = all_ids
        .iter()
        .map(|id| {
            let qualifiers = snapshot.partition(*id).map(|p| p.qualifiers.as_slice()).unwrap_or(&[]);
            (*id, qualifiers)
        })
        .collect();

    let mut out = Vec::with_capacity(row_count);
    for row_index in 0..row_count {
        let value = partition_value(row_index);
        let partition_id = partition_fn::target(&strategy, property, &qualifier_rows, value.as_deref())?;

        let covering_placements: Vec<PlacementId> = snapshot
            .placements_of(entity)
            .into_iter()
            .filter(|p| snapshot.alloc_by_partition(p.id, partition_id).is_some())
            .filter(|p| {
                let columns: BTreeSet<ColumnId> =
                    snapshot.columns_of_placement(p.id).iter().map(|c| c.column_id).collect();
                primary_key.is_subset(&columns)
            })
            .map(|p| p.id)
            .collect();

        if covering_placements.is_empty() {
            return NoCoveringPlacementSnafu { entity }.fail();
        }

        for placement_id in covering_placements {
            out.push(RoutedRow {
                placement_id,
                partition_id,
                row_index,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::SnapshotBuilder;
    use catalog_types::{
        AdapterDescriptor, AdapterId, AllocationColumn, AllocationEntity, AllocationPartition,
        AllocationPlacement, DeployMode, IndexMethod, LogicalColumn, LogicalEntity, LogicalEntityKind,
        Namespace, NamespaceId, NamespaceKind, PartitionGroupId, PartitionId, PartitionProperty,
        PlacementId, PlacementType, PolyType, PrimaryKey, Table,
    };

    const ENTITY: i64 = 1;
    const COL_ID: i64 = 1;
    const ADAPTER: i64 = 1;
    const PLACEMENT: i64 = 1;

    /// A HASH-partitioned table `t(id)` over two partitions, both placed on
    /// one adapter — enough to exercise per-row partition assignment
    /// without needing a second adapter.
    fn hash_partitioned_fixture() -> (Snapshot, EntityId) {
        let mut b = SnapshotBuilder::from_snapshot(&Snapshot::default());
        b.insert_namespace(Namespace {
            id: NamespaceId::new(1),
            name: "public".into(),
            kind: NamespaceKind::Relational,
            owner: "admin".into(),
        });
        let eid = EntityId::new(ENTITY);
        b.insert_entity(LogicalEntity {
            id: eid,
            namespace_id: NamespaceId::new(1),
            name: "t".into(),
            kind: LogicalEntityKind::Table(Table {
                columns: vec![],
                primary_key: PrimaryKey {
                    entity_id: eid,
                    ordered_column_ids: vec![ColumnId::new(COL_ID)],
                },
                foreign_keys: vec![],
                unique_constraints: vec![],
                indexes: vec![],
                is_source: false,
                materialized_view: None,
            }),
        });
        b.insert_column(LogicalColumn::new(ColumnId::new(COL_ID), eid, "id", 0, PolyType::BigInt));
        b.insert_adapter(AdapterDescriptor {
            id: AdapterId::new(ADAPTER),
            unique_name: "adapter1".into(),
            is_persistent: true,
            deploy_mode: DeployMode::Embedded,
            available_index_methods: vec![IndexMethod::BTree],
            is_data_read_only: false,
        });
        b.insert_placement(AllocationPlacement {
            id: PlacementId::new(PLACEMENT),
            logical_entity_id: eid,
            adapter_id: AdapterId::new(ADAPTER),
            placement_type: PlacementType::Automatic,
        });
        b.set_allocation_columns(
            PlacementId::new(PLACEMENT),
            vec![AllocationColumn {
                placement_id: PlacementId::new(PLACEMENT),
                column_id: ColumnId::new(COL_ID),
                physical_name: None,
                physical_position: 0,
            }],
        );
        let partitions = [PartitionId::new(1), PartitionId::new(2)];
        for (i, pid) in partitions.iter().enumerate() {
            b.insert_partition(AllocationPartition {
                id: *pid,
                group_id: PartitionGroupId::new(1),
                qualifiers: vec![],
                is_unbound: false,
            });
            b.insert_allocation_entity(AllocationEntity {
                placement_id: PlacementId::new(PLACEMENT),
                partition_id: *pid,
                adapter_physical_ref: format!("t_{i}"),
            });
        }
        b.set_partition_property(
            eid,
            PartitionProperty::Hash {
                partition_column_id: ColumnId::new(COL_ID),
                partition_ids: partitions.to_vec(),
            },
        );
        (b.build(), eid)
    }

    #[test]
    fn rows_land_on_a_partition_of_the_single_placement() {
        let (snapshot, eid) = hash_partitioned_fixture();
        let values = ["1", "2", "3", "4"];
        let routed = route_rows(&snapshot, eid, values.len(), |i| Some(values[i].to_string())).unwrap();
        assert_eq!(routed.len(), values.len());
        for row in &routed {
            assert_eq!(row.placement_id, PlacementId::new(PLACEMENT));
        }
    }

    #[test]
    fn same_value_always_routes_to_the_same_partition() {
        let (snapshot, eid) = hash_partitioned_fixture();
        let a = route_rows(&snapshot, eid, 1, |_| Some("stable-key".to_string())).unwrap();
        let b = route_rows(&snapshot, eid, 1, |_| Some("stable-key".to_string())).unwrap();
        assert_eq!(a[0].partition_id, b[0].partition_id);
    }

    /// Same table, but fully replicated onto a second adapter covering every
    /// partition with every column.
    fn replicated_fixture() -> (Snapshot, EntityId) {
        let (snapshot, eid) = hash_partitioned_fixture();
        let mut b = SnapshotBuilder::from_snapshot(&snapshot);
        const ADAPTER_TWO: i64 = 2;
        const PLACEMENT_TWO: i64 = 2;
        b.insert_adapter(AdapterDescriptor {
            id: AdapterId::new(ADAPTER_TWO),
            unique_name: "adapter2".into(),
            is_persistent: true,
            deploy_mode: DeployMode::Embedded,
            available_index_methods: vec![IndexMethod::BTree],
            is_data_read_only: false,
        });
        b.insert_placement(AllocationPlacement {
            id: PlacementId::new(PLACEMENT_TWO),
            logical_entity_id: eid,
            adapter_id: AdapterId::new(ADAPTER_TWO),
            placement_type: PlacementType::Automatic,
        });
        b.set_allocation_columns(
            PlacementId::new(PLACEMENT_TWO),
            vec![AllocationColumn {
                placement_id: PlacementId::new(PLACEMENT_TWO),
                column_id: ColumnId::new(COL_ID),
                physical_name: None,
                physical_position: 0,
            }],
        );
        for pid in [PartitionId::new(1), PartitionId::new(2)] {
            b.insert_allocation_entity(AllocationEntity {
                placement_id: PlacementId::new(PLACEMENT_TWO),
                partition_id: pid,
                adapter_physical_ref: format!("t2_{}", pid.get()),
            });
        }
        (b.build(), eid)
    }

    #[test]
    fn a_replicated_row_fans_out_to_every_covering_placement() {
        let (snapshot, eid) = replicated_fixture();
        let routed = route_rows(&snapshot, eid, 1, |_| Some("1".to_string())).unwrap();

        assert_eq!(routed.len(), 2);
        let placements: BTreeSet<PlacementId> = routed.iter().map(|r| r.placement_id).collect();
        assert_eq!(placements, BTreeSet::from([PlacementId::new(PLACEMENT), PlacementId::new(2)]));
        assert!(routed.iter().all(|r| r.row_index == 0 && r.partition_id == routed[0].partition_id));
    }
}
