//! Moves/copies data between allocations during DDL: the four operations
//! the orchestrator drives (`copy_data`, `copy_selective_data`,
//! `copy_allocation_data`, `copy_doc_data`/`copy_graph_data`), all sharing
//! one batched read/route/write loop.

use std::collections::HashMap;
use std::sync::Arc;

use catalog::{Catalog, PhysicalScan, Snapshot, WriteBatch};
use catalog_types::{
    AllocationColumn, AllocationPlacement, ColumnId, EntityId, PartitionId, PlacementId, TransactionId,
};
use observability_deps::tracing::debug;
use partition_fn::Strategy;

use crate::batch::{route_rows, DEFAULT_BATCH_SIZE};
use crate::error::{AdapterFailedSnafu, NotPartitionedSnafu, Result};
use snafu::{OptionExt, ResultExt};

/// Drives batched row migration between allocations. One instance is
/// shared by the whole engine; `batch_size` is the only per-call knob
/// (`DATA_MIGRATOR_BATCH_SIZE` in configuration).
#[derive(Debug)]
pub struct DataMigrator {
    catalog: Arc<Catalog>,
    batch_size: usize,
}

impl DataMigrator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog, batch_size: DEFAULT_BATCH_SIZE }
    }

    pub fn with_batch_size(catalog: Arc<Catalog>, batch_size: usize) -> Self {
        Self { catalog, batch_size }
    }

    /// Full data copy from every existing placement of `entity_id` to
    /// `target_placement`, freshly created by the DDL orchestrator. The
    /// primary-key columns are always added to the read projection so the
    /// target can upsert idempotently across a retried batch.
    pub async fn copy_data(
        &self,
        tx: TransactionId,
        snapshot: &Snapshot,
        entity_id: EntityId,
        target_placement: PlacementId,
        columns: &[ColumnId],
    ) -> Result<()> {
        let entity = snapshot.entity(entity_id)?;
        let pk_columns: Vec<ColumnId> = entity
            .as_table()
            .map(|t| t.primary_key.ordered_column_ids.clone())
            .unwrap_or_default();

        let mut projection: Vec<ColumnId> = columns.to_vec();
        for pk in &pk_columns {
            if !projection.contains(pk) {
                projection.push(*pk);
            }
        }

        let Some(source_placement) = snapshot.placements_of(entity_id).into_iter().next() else {
            return Ok(());
        };
        let target = snapshot.placement(target_placement)?.clone();
        let target_adapter = self.catalog.adapter_handle(target.adapter_id);

        for alloc in snapshot.allocs_of_placement(source_placement.id) {
            let source_columns = select_columns(snapshot.columns_of_placement(source_placement.id), &projection);
            let target_columns = select_columns(snapshot.columns_of_placement(target.id), &projection);
            let pk_positions = pk_positions(&target_columns, &pk_columns);

            self.stream_and_write(
                tx,
                source_placement.adapter_id,
                PhysicalScan {
                    placement: source_placement.clone(),
                    partition_ids: vec![alloc.partition_id],
                    projected_columns: source_columns,
                },
                target_adapter.clone(),
                target.clone(),
                alloc.partition_id,
                target_columns,
                pk_positions,
            )
            .await?;
        }
        debug!(?entity_id, ?target_placement, "copy_data complete");
        Ok(())
    }

    /// Used when merging partitions back to a single one: reads rows
    /// scattered across `source entity`'s current partitions and writes
    /// them all to `target_partition_ids` on `target_placement`, which by
    /// construction is a single-partition (or reduced-partition) target.
    pub async fn copy_selective_data(
        &self,
        tx: TransactionId,
        snapshot: &Snapshot,
        entity_id: EntityId,
        target_placement: PlacementId,
        columns: &[ColumnId],
        target_partition_ids: &[PartitionId],
    ) -> Result<()> {
        let target = snapshot.placement(target_placement)?.clone();
        let target_adapter = self.catalog.adapter_handle(target.adapter_id);
        let target_columns = select_columns(snapshot.columns_of_placement(target.id), columns);
        let entity = snapshot.entity(entity_id)?;
        let pk_columns: Vec<ColumnId> = entity
            .as_table()
            .map(|t| t.primary_key.ordered_column_ids.clone())
            .unwrap_or_default();
        let pk_positions = pk_positions(&target_columns, &pk_columns);

        let single_target = *target_partition_ids
            .first()
            .ok_or(crate::error::Error::NotPartitioned { entity: entity_id })?;

        for source_placement in snapshot.placements_of(entity_id) {
            let source_columns = select_columns(snapshot.columns_of_placement(source_placement.id), columns);
            for alloc in snapshot.allocs_of_placement(source_placement.id) {
                self.stream_and_write(
                    tx,
                    source_placement.adapter_id,
                    PhysicalScan {
                        placement: source_placement.clone(),
                        partition_ids: vec![alloc.partition_id],
                        projected_columns: source_columns.clone(),
                    },
                    target_adapter.clone(),
                    target.clone(),
                    single_target,
                    target_columns.clone(),
                    pk_positions.clone(),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Partition-by-partition redistribution when repartitioning: each
    /// source row is routed to exactly one target partition id via the
    /// partition function, rather than copied en masse to a fixed target.
    pub async fn copy_allocation_data(
        &self,
        tx: TransactionId,
        snapshot: &Snapshot,
        entity_id: EntityId,
        target_placement: PlacementId,
        strategy: &Strategy,
        target_property: &catalog_types::PartitionProperty,
    ) -> Result<()> {
        let target = snapshot.placement(target_placement)?.clone();
        let target_adapter = self.catalog.adapter_handle(target.adapter_id);
        let entity = snapshot.entity(entity_id)?;
        let pk_columns: Vec<ColumnId> = entity
            .as_table()
            .map(|t| t.primary_key.ordered_column_ids.clone())
            .unwrap_or_default();

        let partition_column_id = target_property
            .partition_column_id()
            .context(NotPartitionedSnafu { entity: entity_id })?;

        let target_columns_all: Vec<AllocationColumn> = snapshot.columns_of_placement(target.id).to_vec();
        let pk_positions = pk_positions(&target_columns_all, &pk_columns);

        let target_partition_ids = target_property.partition_ids();
        let target_partitions_owned: Vec<(PartitionId, Vec<catalog_types::Qualifier>)> = target_partition_ids
            .iter()
            .filter_map(|id| snapshot.partition(*id).map(|p| (*id, p.qualifiers.clone())))
            .collect();
        let target_partitions: Vec<(PartitionId, &[catalog_types::Qualifier])> = target_partitions_owned
            .iter()
            .map(|(id, qualifiers)| (*id, qualifiers.as_slice()))
            .collect();

        for source_placement in snapshot.placements_of(entity_id) {
            let source_columns = snapshot.columns_of_placement(source_placement.id).to_vec();
            let partition_col_position = source_columns
                .iter()
                .position(|c| c.column_id == partition_column_id);

            for alloc in snapshot.allocs_of_placement(source_placement.id) {
                let rows = self
                    .read_all(
                        tx,
                        source_placement.adapter_id,
                        PhysicalScan {
                            placement: source_placement.clone(),
                            partition_ids: vec![alloc.partition_id],
                            projected_columns: source_columns.clone(),
                        },
                    )
                    .await?;

                let grouped = route_rows(
                    rows,
                    &source_columns,
                    &target_columns_all,
                    partition_col_position,
                    strategy,
                    target_property,
                    &target_partitions,
                )?;

                for (partition_id, rows) in grouped {
                    if rows.is_empty() {
                        continue;
                    }
                    let batch = WriteBatch {
                        placement: target.clone(),
                        partition_id,
                        columns: target_columns_all.clone(),
                        pk_positions: pk_positions.clone(),
                        rows,
                    };
                    if let Some(handle) = &target_adapter {
                        handle
                            .write_batch(tx, batch)
                            .await
                            .context(AdapterFailedSnafu { adapter: target.adapter_id, entity: entity_id })?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Document/graph payloads are moved through the same row pipeline as
    /// tables: each document (or node/edge property row) is an opaque
    /// `Row`, so `copy_doc_data`/`copy_graph_data` are `copy_data` with an
    /// empty projection (whole-row copy, no column pruning).
    pub async fn copy_doc_data(
        &self,
        tx: TransactionId,
        snapshot: &Snapshot,
        entity_id: EntityId,
        target_placement: PlacementId,
    ) -> Result<()> {
        self.copy_data(tx, snapshot, entity_id, target_placement, &[]).await
    }

    pub async fn copy_graph_data(
        &self,
        tx: TransactionId,
        snapshot: &Snapshot,
        entity_id: EntityId,
        target_placement: PlacementId,
    ) -> Result<()> {
        self.copy_data(tx, snapshot, entity_id, target_placement, &[]).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn stream_and_write(
        &self,
        tx: TransactionId,
        source_adapter: catalog_types::AdapterId,
        scan: PhysicalScan,
        target_adapter: Option<Arc<dyn catalog::Adapter>>,
        target_placement: AllocationPlacement,
        target_partition: PartitionId,
        target_columns: Vec<AllocationColumn>,
        pk_positions: Vec<usize>,
    ) -> Result<()> {
        let Some(source) = self.catalog.adapter_handle(source_adapter) else {
            return Ok(());
        };
        let entity_id = target_placement.logical_entity_id;
        let mut stream = source
            .scan(tx, scan)
            .await
            .context(AdapterFailedSnafu { adapter: source_adapter, entity: entity_id })?;

        loop {
            let rows = stream
                .next_batch(self.batch_size)
                .await
                .context(AdapterFailedSnafu { adapter: source_adapter, entity: entity_id })?;
            if rows.is_empty() {
                break;
            }
            if let Some(handle) = &target_adapter {
                handle
                    .write_batch(
                        tx,
                        WriteBatch {
                            placement: target_placement.clone(),
                            partition_id: target_partition,
                            columns: target_columns.clone(),
                            pk_positions: pk_positions.clone(),
                            rows,
                        },
                    )
                    .await
                    .context(AdapterFailedSnafu { adapter: target_placement.adapter_id, entity: entity_id })?;
            }
        }
        stream.close().await;
        Ok(())
    }

    async fn read_all(&self, tx: TransactionId, adapter_id: catalog_types::AdapterId, scan: PhysicalScan) -> Result<Vec<catalog::Row>> {
        let entity_id = scan.placement.logical_entity_id;
        let Some(adapter) = self.catalog.adapter_handle(adapter_id) else {
            return Ok(Vec::new());
        };
        let mut stream = adapter
            .scan(tx, scan)
            .await
            .context(AdapterFailedSnafu { adapter: adapter_id, entity: entity_id })?;
        let mut all = Vec::new();
        loop {
            let batch = stream
                .next_batch(self.batch_size)
                .await
                .context(AdapterFailedSnafu { adapter: adapter_id, entity: entity_id })?;
            if batch.is_empty() {
                break;
            }
            all.extend(batch);
        }
        stream.close().await;
        Ok(all)
    }
}

fn select_columns(placement_columns: &[AllocationColumn], wanted: &[ColumnId]) -> Vec<AllocationColumn> {
    if wanted.is_empty() {
        return placement_columns.to_vec();
    }
    placement_columns
        .iter()
        .filter(|c| wanted.contains(&c.column_id))
        .cloned()
        .collect()
}

fn pk_positions(columns: &[AllocationColumn], pk_columns: &[ColumnId]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| pk_columns.contains(&c.column_id))
        .map(|(i, _)| i)
        .collect()
}
