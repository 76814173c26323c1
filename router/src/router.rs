//! The core routing algorithm: turn one `Scan` into a `RoutedScan` against a
//! catalog snapshot.

use crate::error::{NoCoveringPlacementSnafu, NoPartitionsSnafu, Result};
use crate::plan::{AllocationScan, QueryInformation, RoutedPlan, RoutedScan};
use crate::policy::RouterPolicy;
use catalog::Snapshot;
use catalog_types::{ColumnId, EntityId, PartitionId, PlacementId, Qualifier};
use partition_fn::{cover, single_placement_cover, HashPartitionFn, ListPartitionFn, PlacementCandidate, RangePartitionFn, Strategy};
use snafu::OptionExt;
use std::collections::{BTreeMap, BTreeSet};

/// Stateless: every call is handed the snapshot it routes against, so a
/// single `Router` can be shared across every statement without locking.
#[derive(Debug, Default, Clone, Copy)]
pub struct Router {
    policy: RouterPolicy,
}

impl Router {
    pub fn new(policy: RouterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RouterPolicy {
        self.policy
    }

    /// Route one `Scan(entity)` against `snapshot`: needed columns,
    /// candidate partitions, per-partition placement cover, union/join
    /// assembly.
    pub fn route_scan(
        &self,
        snapshot: &Snapshot,
        entity: EntityId,
        info: &QueryInformation,
    ) -> Result<RoutedPlan> {
        let logical_entity = snapshot.entity(entity)?;

        let primary_key_columns: BTreeSet<ColumnId> = logical_entity
            .as_table()
            .map(|t| t.primary_key.ordered_column_ids.iter().copied().collect())
            .unwrap_or_default();

        let mut needed: BTreeSet<ColumnId> = info.referenced_columns.clone();
        needed.extend(primary_key_columns.iter().copied());

        let partition_ids = self.candidate_partitions(snapshot, entity, info)?;
        if partition_ids.is_empty() {
            return NoPartitionsSnafu { entity }.fail();
        }

        let mut any_split = false;
        // placement_id -> every allocation scan contributed to it, across
        // every candidate partition.
        let mut sides: BTreeMap<PlacementId, Vec<AllocationScan>> = BTreeMap::new();

        for partition_id in partition_ids {
            let candidates = self.placement_candidates(snapshot, entity, partition_id)?;

            match self.policy {
                RouterPolicy::FullReplication => {
                    if let Some(placement_id) = single_placement_cover(&candidates, &needed) {
                        let scan = self.allocation_scan(snapshot, placement_id, partition_id, &needed);
                        sides.entry(placement_id).or_default().push(scan);
                    } else {
                        let coverage = cover(&candidates, &needed)
                            .context(NoCoveringPlacementSnafu { entity })?;
                        any_split = any_split || coverage.placements.len() > 1;
                        for placement_id in coverage.placements {
                            let mut columns: BTreeSet<ColumnId> = coverage
                                .column_source
                                .iter()
                                .filter(|(_, p)| **p == placement_id)
                                .map(|(c, _)| *c)
                                .collect();
                            // Every side of a cross-adapter join also needs its own
                            // primary-key columns to join on, even when the column
                            // cover assigned the PK's read source to a different side.
                            if let Some(candidate) = candidates.iter().find(|c| c.placement_id == placement_id) {
                                columns.extend(primary_key_columns.intersection(&candidate.columns).copied());
                            }
                            let scan = self.allocation_scan(snapshot, placement_id, partition_id, &columns);
                            sides.entry(placement_id).or_default().push(scan);
                        }
                    }
                }
                RouterPolicy::Icarus => {
                    let placement_id = single_placement_cover(&candidates, &needed)
                        .context(NoCoveringPlacementSnafu { entity })?;
                    let scan = self.allocation_scan(snapshot, placement_id, partition_id, &needed);
                    sides.entry(placement_id).or_default().push(scan);
                }
            }
        }

        let scan = if !any_split {
            let mut all: Vec<AllocationScan> = sides.into_values().flatten().collect();
            if all.len() == 1 {
                RoutedScan::Single(all.remove(0))
            } else {
                RoutedScan::UnionAll(all)
            }
        } else {
            RoutedScan::JoinOnPrimaryKey {
                primary_key: primary_key_columns.into_iter().collect(),
                sides: sides.into_values().collect(),
            }
        };

        Ok(RoutedPlan { entity, scan })
    }

    fn candidate_partitions(
        &self,
        snapshot: &Snapshot,
        entity: EntityId,
        info: &QueryInformation,
    ) -> Result<Vec<PartitionId>> {
        let property = match snapshot.partition_property(entity) {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        if let (Some(value), Some(_column)) = (&info.partition_equality, property.partition_column_id()) {
            let strategy = strategy_for_property(property);
            let ids = property.partition_ids();
            let qualifier_rows: Vec<(PartitionId, &[Qualifier])> = ids
                .iter()
                .map(|id| {
                    let qualifiers = snapshot.partition(*id).map(|p| p.qualifiers.as_slice()).unwrap_or(&[]);
                    (*id, qualifiers)
                })
                .collect();
            let target = partition_fn::target(&strategy, property, &qualifier_rows, Some(value))?;
            Ok(vec![target])
        } else {
            Ok(property.partition_ids())
        }
    }

    fn placement_candidates(
        &self,
        snapshot: &Snapshot,
        entity: EntityId,
        partition_id: PartitionId,
    ) -> Result<Vec<PlacementCandidate>> {
        let mut out = Vec::new();
        for placement in snapshot.placements_of(entity) {
            if snapshot.alloc_by_partition(placement.id, partition_id).is_none() {
                continue;
            }
            let adapter = snapshot.adapter(placement.adapter_id)?;
            let columns: BTreeSet<ColumnId> = snapshot
                .columns_of_placement(placement.id)
                .iter()
                .map(|c| c.column_id)
                .collect();
            out.push(PlacementCandidate {
                placement_id: placement.id,
                adapter_id: placement.adapter_id,
                adapter_is_persistent: adapter.is_persistent,
                columns,
            });
        }
        Ok(out)
    }

    fn allocation_scan(
        &self,
        snapshot: &Snapshot,
        placement_id: PlacementId,
        partition_id: PartitionId,
        wanted: &BTreeSet<ColumnId>,
    ) -> AllocationScan {
        let column_mapping = snapshot
            .columns_of_placement(placement_id)
            .iter()
            .filter(|c| wanted.contains(&c.column_id))
            .map(|c| (c.column_id, c.physical_position))
            .collect();
        AllocationScan {
            placement_id,
            partition_id,
            column_mapping,
        }
    }
}

/// Build the `Strategy` matching a `PartitionProperty`'s shape. Unlike
/// `PartitionFunctionRegistry::resolve`, this never needs a DDL-level name:
/// the property variant already says which of HASH/LIST/RANGE it is.
/// TEMPERATURE has no `Strategy` of its own; the wrapper is unwrapped to the
/// inner scheme, matching how `partition_fn::target` dispatches it.
pub(crate) fn strategy_for_property(property: &catalog_types::PartitionProperty) -> Strategy {
    use catalog_types::PartitionProperty::*;
    match property {
        None { .. } => Strategy::None,
        Hash { .. } => Strategy::Hash(HashPartitionFn),
        List { .. } => Strategy::List(ListPartitionFn::new()),
        Range { .. } => Strategy::Range(RangePartitionFn),
        Temperature { inner, .. } => strategy_for_property(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::SnapshotBuilder;
    use catalog_types::{
        AdapterDescriptor, AdapterId, AllocationColumn, AllocationEntity, AllocationPartition,
        AllocationPlacement, DeployMode, IndexMethod, LogicalColumn, LogicalEntity, LogicalEntityKind,
        Namespace, NamespaceId, NamespaceKind, PartitionGroupId, PlacementType, PolyType, PrimaryKey, Table,
    };

    const NS: i64 = 1;
    const ENTITY: i64 = 1;
    const COL_ID: i64 = 1;
    const COL_A: i64 = 2;
    const COL_B: i64 = 3;
    const ADAPTER_FULL: i64 = 1;
    const ADAPTER_A: i64 = 2;
    const ADAPTER_B: i64 = 3;
    const PLACEMENT_FULL: i64 = 1;
    const PLACEMENT_A: i64 = 2;
    const PLACEMENT_B: i64 = 3;
    const PARTITION: i64 = 1;

    fn adapter(id: i64, persistent: bool) -> AdapterDescriptor {
        AdapterDescriptor {
            id: AdapterId::new(id),
            unique_name: format!("adapter{id}"),
            is_persistent: persistent,
            deploy_mode: DeployMode::Embedded,
            available_index_methods: vec![IndexMethod::BTree],
            is_data_read_only: false,
        }
    }

    fn entity_id() -> EntityId {
        EntityId::new(ENTITY)
    }

    /// One unpartitioned table `t(id, a, b)` with a single placement on
    /// `ADAPTER_FULL` covering every column.
    fn single_placement_fixture() -> Snapshot {
        let mut b = SnapshotBuilder::from_snapshot(&Snapshot::default());
        b.insert_namespace(Namespace {
            id: NamespaceId::new(NS),
            name: "public".into(),
            kind: NamespaceKind::Relational,
            owner: "admin".into(),
        });
        let eid = entity_id();
        b.insert_entity(LogicalEntity {
            id: eid,
            namespace_id: NamespaceId::new(NS),
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
        b.insert_column(LogicalColumn::new(ColumnId::new(COL_A), eid, "a", 1, PolyType::Varchar));
        b.insert_column(LogicalColumn::new(ColumnId::new(COL_B), eid, "b", 2, PolyType::Varchar));
        b.insert_adapter(adapter(ADAPTER_FULL, true));
        b.insert_placement(AllocationPlacement {
            id: PlacementId::new(PLACEMENT_FULL),
            logical_entity_id: eid,
            adapter_id: AdapterId::new(ADAPTER_FULL),
            placement_type: PlacementType::Automatic,
        });
        b.set_allocation_columns(
            PlacementId::new(PLACEMENT_FULL),
            vec![COL_ID, COL_A, COL_B]
                .into_iter()
                .enumerate()
                .map(|(pos, col)| AllocationColumn {
                    placement_id: PlacementId::new(PLACEMENT_FULL),
                    column_id: ColumnId::new(col),
                    physical_name: None,
                    physical_position: pos as i32,
                })
                .collect(),
        );
        b.insert_partition(AllocationPartition {
            id: PartitionId::new(PARTITION),
            group_id: PartitionGroupId::new(1),
            qualifiers: vec![],
            is_unbound: false,
        });
        b.insert_allocation_entity(AllocationEntity {
            placement_id: PlacementId::new(PLACEMENT_FULL),
            partition_id: PartitionId::new(PARTITION),
            adapter_physical_ref: "t".into(),
        });
        b.set_partition_property(
            eid,
            catalog_types::PartitionProperty::None {
                partition_id: PartitionId::new(PARTITION),
            },
        );
        b.build()
    }

    /// Same table, but split vertically: `ADAPTER_A` carries `id, a`,
    /// `ADAPTER_B` carries `id, b` — neither covers everything alone.
    fn split_placement_fixture() -> Snapshot {
        let mut b = SnapshotBuilder::from_snapshot(&single_placement_fixture());
        let eid = entity_id();
        b.remove_placement(PlacementId::new(PLACEMENT_FULL));
        b.insert_adapter(adapter(ADAPTER_A, true));
        b.insert_adapter(adapter(ADAPTER_B, false));
        for (placement, adapter_id, cols) in [
            (PLACEMENT_A, ADAPTER_A, vec![COL_ID, COL_A]),
            (PLACEMENT_B, ADAPTER_B, vec![COL_ID, COL_B]),
        ] {
            b.insert_placement(AllocationPlacement {
                id: PlacementId::new(placement),
                logical_entity_id: eid,
                adapter_id: AdapterId::new(adapter_id),
                placement_type: PlacementType::Automatic,
            });
            b.set_allocation_columns(
                PlacementId::new(placement),
                cols.into_iter()
                    .enumerate()
                    .map(|(pos, col)| AllocationColumn {
                        placement_id: PlacementId::new(placement),
                        column_id: ColumnId::new(col),
                        physical_name: None,
                        physical_position: pos as i32,
                    })
                    .collect(),
            );
            b.insert_allocation_entity(AllocationEntity {
                placement_id: PlacementId::new(placement),
                partition_id: PartitionId::new(PARTITION),
                adapter_physical_ref: format!("t_{placement}"),
            });
        }
        b.build()
    }

    #[test]
    fn single_placement_covers_whole_scan() {
        let snapshot = single_placement_fixture();
        let router = Router::new(RouterPolicy::FullReplication);
        let info = QueryInformation::new().with_column(ColumnId::new(COL_A));
        let routed = router.route_scan(&snapshot, entity_id(), &info).unwrap();
        match routed.scan {
            RoutedScan::Single(scan) => assert_eq!(scan.placement_id, PlacementId::new(PLACEMENT_FULL)),
            other => panic!("expected a single allocation scan, got {other:?}"),
        }
    }

    #[test]
    fn full_replication_joins_when_columns_are_split() {
        let snapshot = split_placement_fixture();
        let router = Router::new(RouterPolicy::FullReplication);
        let info = QueryInformation::new()
            .with_column(ColumnId::new(COL_A))
            .with_column(ColumnId::new(COL_B));
        let routed = router.route_scan(&snapshot, entity_id(), &info).unwrap();
        match routed.scan {
            RoutedScan::JoinOnPrimaryKey { sides, primary_key } => {
                assert_eq!(sides.len(), 2);
                assert_eq!(primary_key, vec![ColumnId::new(COL_ID)]);
            }
            other => panic!("expected a join, got {other:?}"),
        }
    }

    #[test]
    fn icarus_cancels_instead_of_joining() {
        let snapshot = split_placement_fixture();
        let router = Router::new(RouterPolicy::Icarus);
        let info = QueryInformation::new()
            .with_column(ColumnId::new(COL_A))
            .with_column(ColumnId::new(COL_B));
        let err = router.route_scan(&snapshot, entity_id(), &info).unwrap_err();
        assert!(matches!(err, crate::error::Error::NoCoveringPlacement { .. }));
    }

    #[test]
    fn query_needs_only_one_side_under_icarus() {
        let snapshot = split_placement_fixture();
        let router = Router::new(RouterPolicy::Icarus);
        let info = QueryInformation::new().with_column(ColumnId::new(COL_A));
        let routed = router.route_scan(&snapshot, entity_id(), &info).unwrap();
        match routed.scan {
            RoutedScan::Single(scan) => assert_eq!(scan.placement_id, PlacementId::new(PLACEMENT_A)),
            other => panic!("expected a single allocation scan, got {other:?}"),
        }
    }
}
