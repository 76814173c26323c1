//! Drives every structural change through the same sequence: validate the
//! request against the current snapshot, take an exclusive lock on the
//! affected entity, mutate a builder, publish it, call the affected
//! adapters, migrate data if the change moved or repartitioned it, then
//! invalidate whatever has cached the old structure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use catalog::{Catalog, Snapshot, SnapshotBuilder};
use catalog_types::{
    sequence_names, AdapterDescriptor, AllocationColumn, AllocationEntity, AllocationPartition,
    AllocationPlacement, ColumnId, DeployMode, EntityId, Index, IndexMethod, LogicalColumn,
    LogicalEntity, LogicalEntityKind, Namespace, NamespaceId, NamespaceKind, PartitionGroupId,
    PartitionId, PartitionProperty, PlacementId, PlacementType, PrimaryKey, Qualifier, Table,
    TransactionId,
};
use lock_manager::LockMode;
use migrator::DataMigrator;
use observability_deps::tracing::{debug, info};
use partition_fn::{PartitionFunctionRegistry, Strategy};
use snafu::{OptionExt, ResultExt};
use txn::TransactionCoordinator;

use crate::error::{
    AdapterAlreadyExistsSnafu, AdapterFailedSnafu, AdapterNotFoundByNameSnafu,
    AlreadyPartitionedSnafu, ColumnAlreadyExistsSnafu, ColumnInUseSnafu, EntityAlreadyExistsSnafu,
    ForeignKeyPreventsRemovalSnafu, IndexColumnsNotPlacedSnafu, LastColumnSnafu,
    LastPlacementSnafu, NamespaceAlreadyExistsSnafu, NamespaceNotEmptySnafu,
    NamespaceNotFoundSnafu, NotATableSnafu, NotNullWithoutDefaultSnafu, NotPartitionedSnafu,
    PlacementAlreadyOnAdapterSnafu, Result, SourceEntitySnafu, UnknownPartitionFunctionSnafu,
    UnsupportedIndexMethodSnafu, UnsupportedPartitionColumnSnafu,
};
use crate::spec::{ColumnSpec, PartitionSpec};

/// Owns every collaborator a schema-change operation needs: its own catalog
/// handle (the coordinator exposes none), the coordinator for locking and
/// adapter participant bookkeeping, the migrator for data movement, and the
/// fixed partition function registry. A counter stands in for plan cache
/// invalidation, bumped on every operation that changes structure.
#[derive(Debug)]
pub struct DdlOrchestrator {
    catalog: Arc<Catalog>,
    coordinator: Arc<TransactionCoordinator>,
    migrator: Arc<DataMigrator>,
    partition_functions: PartitionFunctionRegistry,
    plan_cache_epoch: AtomicU64,
}

impl DdlOrchestrator {
    pub fn new(catalog: Arc<Catalog>, coordinator: Arc<TransactionCoordinator>, migrator: Arc<DataMigrator>) -> Self {
        Self {
            catalog,
            coordinator,
            migrator,
            partition_functions: PartitionFunctionRegistry::new(),
            plan_cache_epoch: AtomicU64::new(0),
        }
    }

    /// Bumped on every published structural change; a plan cache keys its
    /// entries against this to know when a cached physical plan is stale.
    pub fn plan_cache_epoch(&self) -> u64 {
        self.plan_cache_epoch.load(Ordering::Acquire)
    }

    fn invalidate_plan_cache(&self) {
        self.plan_cache_epoch.fetch_add(1, Ordering::AcqRel);
        debug!("plan cache epoch bumped");
    }

    fn publish_checked(&self, builder: SnapshotBuilder, entity_id: EntityId) -> Result<Arc<Snapshot>> {
        let next = builder.build();
        catalog::invariants::check_entity_invariants(&next, entity_id)?;
        Ok(self.catalog.publish(next))
    }

    /// Like [`Self::publish_checked`], but runs an extra validation against
    /// the built-but-not-yet-published snapshot so a failure never becomes
    /// visible through [`Catalog::publish`].
    fn publish_checked_with(
        &self,
        builder: SnapshotBuilder,
        entity_id: EntityId,
        extra: impl FnOnce(&Snapshot) -> catalog::Result<()>,
    ) -> Result<Arc<Snapshot>> {
        let next = builder.build();
        catalog::invariants::check_entity_invariants(&next, entity_id)?;
        extra(&next)?;
        Ok(self.catalog.publish(next))
    }

    // ---- namespaces --------------------------------------------------

    pub async fn create_namespace(
        &self,
        name: &str,
        kind: NamespaceKind,
        owner: &str,
        if_not_exists: bool,
    ) -> Result<NamespaceId> {
        let snapshot = self.catalog.current_snapshot();
        if let Ok(existing) = snapshot.namespace_by_name(name) {
            if if_not_exists {
                return Ok(existing.id);
            }
            return NamespaceAlreadyExistsSnafu { name }.fail();
        }

        let id = NamespaceId::new(self.catalog.sequences().next_val(sequence_names::NAMESPACE));
        let mut builder = self.catalog.new_builder();
        builder.insert_namespace(Namespace {
            id,
            name: name.to_string(),
            kind,
            owner: owner.to_string(),
        });
        self.catalog.publish(builder.build());
        self.invalidate_plan_cache();
        info!(%name, ?kind, "namespace created");
        Ok(id)
    }

    pub async fn drop_namespace(&self, name: &str, if_exists: bool) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let ns_id = match snapshot.namespace_by_name(name) {
            Ok(ns) => ns.id,
            Err(_) if if_exists => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if snapshot.all_entities().values().any(|e| e.namespace_id == ns_id) {
            return NamespaceNotEmptySnafu { name }.fail();
        }

        let mut builder = self.catalog.new_builder();
        builder.remove_namespace(ns_id);
        self.catalog.publish(builder.build());
        self.invalidate_plan_cache();
        Ok(())
    }

    // ---- tables --------------------------------------------------------

    pub async fn create_table(
        &self,
        tx: TransactionId,
        namespace_id: NamespaceId,
        name: &str,
        columns: Vec<ColumnSpec>,
        primary_key_names: &[String],
        adapters: &[catalog_types::AdapterId],
    ) -> Result<EntityId> {
        let snapshot = self.catalog.current_snapshot();
        snapshot
            .namespace(namespace_id)
            .context(NamespaceNotFoundSnafu { id: namespace_id })?;
        if snapshot.entity_by_name(namespace_id, name).is_ok() {
            return EntityAlreadyExistsSnafu { namespace: namespace_id, name }.fail();
        }

        let entity_id = EntityId::new(self.catalog.sequences().next_val(sequence_names::ENTITY));
        let mut logical_columns = Vec::with_capacity(columns.len());
        for (position, spec) in columns.into_iter().enumerate() {
            if !spec.nullable && spec.default_value.is_none() {
                return NotNullWithoutDefaultSnafu { column: spec.name }.fail();
            }
            let column_id = ColumnId::new(self.catalog.sequences().next_val(sequence_names::COLUMN));
            let mut column = LogicalColumn::new(column_id, entity_id, spec.name, position as i32, spec.poly_type);
            column.nullable = spec.nullable;
            column.default_value = spec.default_value;
            column.collection_type = spec.collection_type;
            logical_columns.push(column);
        }
        let pk_columns: Vec<ColumnId> = primary_key_names
            .iter()
            .filter_map(|n| logical_columns.iter().find(|c| &c.name == n).map(|c| c.id))
            .collect();

        let partition_id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
        let group_id = PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP));

        let table = Table {
            columns: logical_columns.clone(),
            primary_key: PrimaryKey { entity_id, ordered_column_ids: pk_columns },
            foreign_keys: vec![],
            unique_constraints: vec![],
            indexes: vec![],
            is_source: false,
            materialized_view: None,
        };
        let entity = LogicalEntity {
            id: entity_id,
            namespace_id,
            name: name.to_string(),
            kind: LogicalEntityKind::Table(table),
        };

        let mut builder = self.catalog.new_builder();
        builder.insert_entity(entity.clone());
        for column in &logical_columns {
            builder.insert_column(column.clone());
        }
        builder.insert_partition(AllocationPartition {
            id: partition_id,
            group_id,
            qualifiers: vec![Qualifier::Unbound],
            is_unbound: true,
        });
        builder.set_partition_property(entity_id, PartitionProperty::None { partition_id });

        let mut placement_adapters = Vec::with_capacity(adapters.len());
        for &adapter_id in adapters {
            let placement_id = PlacementId::new(self.catalog.sequences().next_val(sequence_names::PLACEMENT));
            builder.insert_placement(AllocationPlacement {
                id: placement_id,
                logical_entity_id: entity_id,
                adapter_id,
                placement_type: PlacementType::Automatic,
            });
            let alloc_columns = logical_columns
                .iter()
                .enumerate()
                .map(|(i, c)| AllocationColumn {
                    placement_id,
                    column_id: c.id,
                    physical_name: None,
                    physical_position: i as i32,
                })
                .collect();
            builder.set_allocation_columns(placement_id, alloc_columns);
            builder.insert_allocation_entity(AllocationEntity {
                placement_id,
                partition_id,
                adapter_physical_ref: format!("{name}_{partition_id}"),
            });
            placement_adapters.push(adapter_id);
        }

        self.publish_checked(builder, entity_id)?;

        for adapter_id in placement_adapters {
            if let Some(handle) = self.catalog.adapter_handle(adapter_id) {
                handle
                    .create_table(tx, &entity, &[partition_id])
                    .await
                    .context(AdapterFailedSnafu { adapter: adapter_id, entity: entity_id, phase: "create_table" })?;
                self.coordinator.add_participant(tx, adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        info!(?entity_id, %name, "table created");
        Ok(entity_id)
    }

    pub async fn add_column(&self, tx: TransactionId, entity_id: EntityId, spec: ColumnSpec) -> Result<ColumnId> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?;
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        let table = entity.as_table().context(NotATableSnafu { entity: entity_id })?;
        if table.columns.iter().any(|c| c.name == spec.name) {
            return ColumnAlreadyExistsSnafu { entity: entity_id, name: spec.name }.fail();
        }
        if !spec.nullable && spec.default_value.is_none() {
            return NotNullWithoutDefaultSnafu { column: spec.name }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let column_id = ColumnId::new(self.catalog.sequences().next_val(sequence_names::COLUMN));
        let position = table.columns.len() as i32;
        let mut column = LogicalColumn::new(column_id, entity_id, spec.name, position, spec.poly_type);
        column.nullable = spec.nullable;
        column.default_value = spec.default_value;
        column.collection_type = spec.collection_type;

        let mut updated_entity = entity.clone();
        updated_entity.as_table_mut().expect("checked above").columns.push(column.clone());

        let placements = snapshot.placements_of(entity_id);
        let mut builder = self.catalog.new_builder();
        builder.insert_entity(updated_entity.clone());
        builder.insert_column(column.clone());
        for placement in &placements {
            let mut cols = snapshot.columns_of_placement(placement.id).to_vec();
            let physical_position = cols.len() as i32;
            cols.push(AllocationColumn {
                placement_id: placement.id,
                column_id,
                physical_name: None,
                physical_position,
            });
            builder.set_allocation_columns(placement.id, cols);
        }

        self.publish_checked(builder, entity_id)?;

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .add_column(tx, &updated_entity, &column)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "add_column" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        Ok(column_id)
    }

    pub async fn drop_column(&self, tx: TransactionId, entity_id: EntityId, column_id: ColumnId) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?;
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        let table = entity.as_table().context(NotATableSnafu { entity: entity_id })?;
        if table.columns.len() <= 1 {
            return LastColumnSnafu { entity: entity_id }.fail();
        }
        let in_use = table.primary_key.ordered_column_ids.contains(&column_id)
            || table
                .foreign_keys
                .iter()
                .any(|fk| fk.source_cols.contains(&column_id) || fk.target_cols.contains(&column_id))
            || table.unique_constraints.iter().any(|u| u.column_ids.contains(&column_id))
            || table.indexes.iter().any(|ix| ix.column_ids.contains(&column_id));
        if in_use {
            return ColumnInUseSnafu { column: column_id }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let mut updated_entity = entity.clone();
        updated_entity.as_table_mut().expect("checked above").columns.retain(|c| c.id != column_id);

        let placements = snapshot.placements_of(entity_id);
        let mut dropped_alloc_columns = Vec::new();
        let mut builder = self.catalog.new_builder();
        builder.insert_entity(updated_entity);
        builder.remove_column(column_id);
        for placement in &placements {
            let cols = snapshot.columns_of_placement(placement.id);
            if let Some(alloc_col) = cols.iter().find(|c| c.column_id == column_id).cloned() {
                dropped_alloc_columns.push((placement.adapter_id, alloc_col));
            }
            let remaining: Vec<_> = cols.iter().filter(|c| c.column_id != column_id).cloned().collect();
            builder.set_allocation_columns(placement.id, remaining);
        }

        self.publish_checked(builder, entity_id)?;

        for (adapter_id, alloc_col) in &dropped_alloc_columns {
            if let Some(handle) = self.catalog.adapter_handle(*adapter_id) {
                handle
                    .drop_column(tx, alloc_col)
                    .await
                    .context(AdapterFailedSnafu { adapter: *adapter_id, entity: entity_id, phase: "drop_column" })?;
                self.coordinator.add_participant(tx, *adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    // ---- placements -----------------------------------------------------

    pub async fn add_placement(
        &self,
        tx: TransactionId,
        entity_id: EntityId,
        adapter_id: catalog_types::AdapterId,
        columns: Option<Vec<ColumnId>>,
        partition_subset: Option<Vec<PartitionId>>,
        allow_manual_pk_override: bool,
    ) -> Result<PlacementId> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        if snapshot.placements_of(entity_id).iter().any(|p| p.adapter_id == adapter_id) {
            return PlacementAlreadyOnAdapterSnafu { entity: entity_id, adapter: adapter_id }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let pk_columns = entity.as_table().map(|t| t.primary_key.ordered_column_ids.clone()).unwrap_or_default();
        let all_columns: Vec<ColumnId> = snapshot.columns_of_entity(entity_id).iter().map(|c| c.id).collect();
        let mut target_columns = columns.clone().unwrap_or_else(|| all_columns.clone());
        for pk in &pk_columns {
            if !target_columns.contains(pk) {
                target_columns.push(*pk);
            }
        }
        let all_partitions = snapshot.partition_property(entity_id).map(|p| p.partition_ids()).unwrap_or_default();
        let target_partitions = partition_subset.clone().unwrap_or(all_partitions);

        let placement_id = PlacementId::new(self.catalog.sequences().next_val(sequence_names::PLACEMENT));
        let placement_type = if columns.is_some() || partition_subset.is_some() {
            PlacementType::Manual
        } else {
            PlacementType::Automatic
        };

        let mut builder = self.catalog.new_builder();
        builder.insert_placement(AllocationPlacement {
            id: placement_id,
            logical_entity_id: entity_id,
            adapter_id,
            placement_type,
        });
        let alloc_columns: Vec<AllocationColumn> = target_columns
            .iter()
            .enumerate()
            .map(|(i, &column_id)| AllocationColumn { placement_id, column_id, physical_name: None, physical_position: i as i32 })
            .collect();
        builder.set_allocation_columns(placement_id, alloc_columns);
        for &partition_id in &target_partitions {
            builder.insert_allocation_entity(AllocationEntity {
                placement_id,
                partition_id,
                adapter_physical_ref: format!("{}_{}", entity.name, partition_id),
            });
        }

        let published = self.publish_checked_with(builder, entity_id, |snap| {
            catalog::invariants::check_pk_placement_type(snap, placement_id, allow_manual_pk_override)
        })?;

        if let Some(handle) = self.catalog.adapter_handle(adapter_id) {
            handle
                .create_table(tx, &entity, &target_partitions)
                .await
                .context(AdapterFailedSnafu { adapter: adapter_id, entity: entity_id, phase: "create_table" })?;
            self.coordinator.add_participant(tx, adapter_id)?;
        }

        self.migrator.copy_data(tx, &published, entity_id, placement_id, &target_columns).await?;

        self.invalidate_plan_cache();
        info!(?entity_id, ?placement_id, ?adapter_id, "placement added");
        Ok(placement_id)
    }

    pub async fn drop_placement(&self, tx: TransactionId, entity_id: EntityId, placement_id: PlacementId) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        let placement = snapshot.placement(placement_id)?.clone();

        let other_placements: Vec<_> = snapshot
            .placements_of(entity_id)
            .into_iter()
            .filter(|p| p.id != placement_id)
            .collect();
        for column in snapshot.columns_of_entity(entity_id) {
            let covered = other_placements
                .iter()
                .any(|p| snapshot.columns_of_placement(p.id).iter().any(|ac| ac.column_id == column.id));
            if !covered {
                return LastPlacementSnafu { entity: entity_id, placement: placement_id }.fail();
            }
        }
        if let Some(property) = snapshot.partition_property(entity_id) {
            for partition_id in property.partition_ids() {
                let covered = other_placements.iter().any(|p| snapshot.alloc_by_partition(p.id, partition_id).is_some());
                if !covered {
                    return LastPlacementSnafu { entity: entity_id, placement: placement_id }.fail();
                }
            }
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let dropped_partition_ids: Vec<PartitionId> =
            snapshot.allocs_of_placement(placement_id).iter().map(|a| a.partition_id).collect();

        let mut builder = self.catalog.new_builder();
        builder.remove_placement(placement_id);
        self.publish_checked(builder, entity_id)?;

        if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
            handle
                .drop_table(tx, &entity, &dropped_partition_ids)
                .await
                .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_table" })?;
            self.coordinator.add_participant(tx, placement.adapter_id)?;
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    pub async fn modify_placement_columns(
        &self,
        tx: TransactionId,
        placement_id: PlacementId,
        target_columns: Vec<ColumnId>,
        allow_manual_pk_override: bool,
    ) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let placement = snapshot.placement(placement_id)?.clone();
        let entity_id = placement.logical_entity_id;
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let current_columns: Vec<ColumnId> =
            snapshot.columns_of_placement(placement_id).iter().map(|c| c.column_id).collect();
        let added: Vec<ColumnId> = target_columns.iter().filter(|c| !current_columns.contains(c)).copied().collect();
        let removed_cols: Vec<AllocationColumn> = snapshot
            .columns_of_placement(placement_id)
            .iter()
            .filter(|c| !target_columns.contains(&c.column_id))
            .cloned()
            .collect();

        let alloc_columns: Vec<AllocationColumn> = target_columns
            .iter()
            .enumerate()
            .map(|(i, &column_id)| AllocationColumn { placement_id, column_id, physical_name: None, physical_position: i as i32 })
            .collect();

        let mut builder = self.catalog.new_builder();
        builder.set_allocation_columns(placement_id, alloc_columns);
        let published = self.publish_checked_with(builder, entity_id, |snap| {
            catalog::invariants::check_pk_placement_type(snap, placement_id, allow_manual_pk_override)
        })?;

        if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
            for column_id in &added {
                let column = snapshot.column(*column_id)?;
                handle
                    .add_column(tx, &entity, column)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "add_column" })?;
            }
            for alloc_col in &removed_cols {
                handle
                    .drop_column(tx, alloc_col)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_column" })?;
            }
            self.coordinator.add_participant(tx, placement.adapter_id)?;
        }

        if !added.is_empty() {
            self.migrator.copy_data(tx, &published, entity_id, placement_id, &added).await?;
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    pub async fn modify_partitions_on_placement(
        &self,
        tx: TransactionId,
        placement_id: PlacementId,
        target_partition_ids: Vec<PartitionId>,
    ) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let placement = snapshot.placement(placement_id)?.clone();
        let entity_id = placement.logical_entity_id;
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let current: Vec<PartitionId> = snapshot.allocs_of_placement(placement_id).iter().map(|a| a.partition_id).collect();
        let added: Vec<PartitionId> = target_partition_ids.iter().filter(|p| !current.contains(p)).copied().collect();
        let removed: Vec<PartitionId> = current.iter().filter(|p| !target_partition_ids.contains(p)).copied().collect();

        let mut builder = self.catalog.new_builder();
        for &partition_id in &added {
            builder.insert_allocation_entity(AllocationEntity {
                placement_id,
                partition_id,
                adapter_physical_ref: format!("{}_{}", entity.name, partition_id),
            });
        }
        for &partition_id in &removed {
            builder.remove_allocation_entity(placement_id, partition_id);
        }
        let published = self.publish_checked(builder, entity_id)?;

        if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
            if !added.is_empty() {
                handle
                    .create_table(tx, &entity, &added)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "create_table" })?;
            }
            if !removed.is_empty() {
                handle
                    .drop_table(tx, &entity, &removed)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_table" })?;
            }
            self.coordinator.add_participant(tx, placement.adapter_id)?;
        }

        if !added.is_empty() {
            let existing_columns: Vec<ColumnId> =
                snapshot.columns_of_placement(placement_id).iter().map(|c| c.column_id).collect();
            self.migrator.copy_data(tx, &published, entity_id, placement_id, &existing_columns).await?;
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    // ---- partitioning ----------------------------------------------------

    /// Splits a single-partition entity into a HASH/LIST/RANGE/TEMPERATURE
    /// scheme. Published in two steps: first the new partitions and their
    /// allocation entities land alongside the still-live old partition, so
    /// the migrator can read from it; once every placement's rows have been
    /// routed into the new partitions, a second publish drops the old one.
    pub async fn partition_entity(
        &self,
        tx: TransactionId,
        entity_id: EntityId,
        partition_column_id: ColumnId,
        spec: PartitionSpec,
    ) -> Result<()> {
        let snapshot0 = self.catalog.current_snapshot();
        let entity = snapshot0.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        entity.as_table().context(NotATableSnafu { entity: entity_id })?;

        let old_partition_id = match snapshot0.partition_property(entity_id) {
            Some(PartitionProperty::None { partition_id }) => *partition_id,
            _ => return AlreadyPartitionedSnafu { entity: entity_id }.fail(),
        };

        let function_name = spec.function_name();
        let strategy = self
            .partition_functions
            .resolve(function_name)
            .context(UnknownPartitionFunctionSnafu { name: function_name })?;
        let column = snapshot0.column(partition_column_id)?;
        if !strategy.supports_column_of_type(column.poly_type) {
            return UnsupportedPartitionColumnSnafu { column: partition_column_id, function: function_name }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let (new_partitions, new_property) = self.build_partitions(partition_column_id, &strategy, &spec)?;
        partition_fn::validate(&strategy, &new_property)?;

        let new_partition_ids: Vec<PartitionId> = new_partitions.iter().map(|p| p.id).collect();
        let placements = snapshot0.placements_of(entity_id);

        let mut builder = self.catalog.new_builder();
        for partition in &new_partitions {
            builder.insert_partition(partition.clone());
        }
        for placement in &placements {
            for &partition_id in &new_partition_ids {
                builder.insert_allocation_entity(AllocationEntity {
                    placement_id: placement.id,
                    partition_id,
                    adapter_physical_ref: format!("{}_{}", entity.name, partition_id),
                });
            }
        }
        let staged = self.catalog.publish(builder.build());

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .create_table(tx, &entity, &new_partition_ids)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "create_table" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        for placement in &placements {
            self.migrator
                .copy_allocation_data(tx, &staged, entity_id, placement.id, &strategy, &new_property)
                .await?;
        }

        let mut builder = SnapshotBuilder::from_snapshot(&staged);
        for placement in &placements {
            builder.remove_allocation_entity(placement.id, old_partition_id);
        }
        builder.remove_partition(old_partition_id);
        builder.set_partition_property(entity_id, new_property);
        self.publish_checked(builder, entity_id)?;

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .drop_table(tx, &entity, &[old_partition_id])
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_table" })?;
            }
        }

        self.invalidate_plan_cache();
        info!(?entity_id, function = function_name, "entity partitioned");
        Ok(())
    }

    /// Collapses every current partition of `entity_id` back to one. Mirrors
    /// `partition_entity`'s two-phase publish: add the merged partition and
    /// copy data into it first, then drop the originals.
    pub async fn merge_partitions(&self, tx: TransactionId, entity_id: EntityId) -> Result<()> {
        let snapshot0 = self.catalog.current_snapshot();
        let entity = snapshot0.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        let property = snapshot0
            .partition_property(entity_id)
            .cloned()
            .context(NotPartitionedSnafu { entity: entity_id })?;
        if !property.is_partitioned() {
            return NotPartitionedSnafu { entity: entity_id }.fail();
        }
        let old_partition_ids = property.partition_ids();

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let new_partition_id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
        let new_group_id = PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP));
        let placements = snapshot0.placements_of(entity_id);

        let mut builder = self.catalog.new_builder();
        builder.insert_partition(AllocationPartition {
            id: new_partition_id,
            group_id: new_group_id,
            qualifiers: vec![Qualifier::Unbound],
            is_unbound: true,
        });
        for placement in &placements {
            builder.insert_allocation_entity(AllocationEntity {
                placement_id: placement.id,
                partition_id: new_partition_id,
                adapter_physical_ref: format!("{}_{}", entity.name, new_partition_id),
            });
        }
        let staged = self.catalog.publish(builder.build());

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .create_table(tx, &entity, &[new_partition_id])
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "create_table" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        for placement in &placements {
            let columns: Vec<ColumnId> = snapshot0.columns_of_placement(placement.id).iter().map(|c| c.column_id).collect();
            self.migrator
                .copy_selective_data(tx, &staged, entity_id, placement.id, &columns, &[new_partition_id])
                .await?;
        }

        let mut builder = SnapshotBuilder::from_snapshot(&staged);
        for placement in &placements {
            for &partition_id in &old_partition_ids {
                builder.remove_allocation_entity(placement.id, partition_id);
            }
        }
        for &partition_id in &old_partition_ids {
            builder.remove_partition(partition_id);
        }
        builder.set_partition_property(entity_id, PartitionProperty::None { partition_id: new_partition_id });
        self.publish_checked(builder, entity_id)?;

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .drop_table(tx, &entity, &old_partition_ids)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_table" })?;
            }
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    fn build_partitions(
        &self,
        partition_column_id: ColumnId,
        strategy: &Strategy,
        spec: &PartitionSpec,
    ) -> Result<(Vec<AllocationPartition>, PartitionProperty)> {
        match spec {
            PartitionSpec::Hash { count } => {
                let ids: Vec<PartitionId> = (0..*count)
                    .map(|_| PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION)))
                    .collect();
                let partitions = ids
                    .iter()
                    .map(|&id| AllocationPartition {
                        id,
                        group_id: PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP)),
                        qualifiers: vec![],
                        is_unbound: false,
                    })
                    .collect();
                let property = PartitionProperty::Hash { partition_column_id, partition_ids: ids };
                Ok((partitions, property))
            }
            PartitionSpec::List { groups } => {
                let mut partitions = Vec::new();
                let mut ids = Vec::new();
                let mut qualifier_check = Vec::new();
                for group in groups {
                    let id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
                    qualifier_check.push((id, group.clone()));
                    partitions.push(AllocationPartition {
                        id,
                        group_id: PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP)),
                        qualifiers: vec![Qualifier::List(group.clone())],
                        is_unbound: false,
                    });
                    ids.push(id);
                }
                partition_fn::validate_list_qualifiers(&qualifier_check)?;
                let unbound_id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
                partitions.push(AllocationPartition {
                    id: unbound_id,
                    group_id: PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP)),
                    qualifiers: vec![Qualifier::Unbound],
                    is_unbound: true,
                });
                let property = PartitionProperty::List {
                    partition_column_id,
                    partition_ids: ids,
                    unbound_partition_id: Some(unbound_id),
                };
                Ok((partitions, property))
            }
            PartitionSpec::Range { bounds } => {
                let mut partitions = Vec::new();
                let mut ids = Vec::new();
                let mut qualifier_check = Vec::new();
                for (low, high) in bounds {
                    let (low, high) = partition_fn::RangePartitionFn::canonicalize_bounds(low, high);
                    let id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
                    qualifier_check.push((id, low.clone(), high.clone()));
                    partitions.push(AllocationPartition {
                        id,
                        group_id: PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP)),
                        qualifiers: vec![Qualifier::Range { low, high }],
                        is_unbound: false,
                    });
                    ids.push(id);
                }
                partition_fn::validate_range_qualifiers(&qualifier_check)?;
                let unbound_id = PartitionId::new(self.catalog.sequences().next_val(sequence_names::PARTITION));
                partitions.push(AllocationPartition {
                    id: unbound_id,
                    group_id: PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP)),
                    qualifiers: vec![Qualifier::Unbound],
                    is_unbound: true,
                });
                let property = PartitionProperty::Range {
                    partition_column_id,
                    partition_ids: ids,
                    unbound_partition_id: Some(unbound_id),
                };
                Ok((partitions, property))
            }
            PartitionSpec::Temperature { inner, hot_in_pct, hot_out_pct, frequency_interval_sec, cost_indication } => {
                let (mut partitions, inner_property) = self.build_partitions(partition_column_id, strategy, inner)?;
                // Every partition starts hot; the reclassification sweep
                // (driven by `AccessTracker`) moves cold ones later.
                let hot_group_id = PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP));
                let cold_group_id = PartitionGroupId::new(self.catalog.sequences().next_val(sequence_names::PARTITION_GROUP));
                for partition in &mut partitions {
                    partition.group_id = hot_group_id;
                }
                let config = catalog_types::TemperatureConfig {
                    hot_group_id,
                    cold_group_id,
                    hot_in_pct: *hot_in_pct,
                    hot_out_pct: *hot_out_pct,
                    frequency_interval_sec: *frequency_interval_sec,
                    cost_indication: *cost_indication,
                };
                let property = PartitionProperty::Temperature { inner: Box::new(inner_property), config };
                Ok((partitions, property))
            }
        }
    }

    // ---- indexes, truncate, drop ------------------------------------------

    pub async fn add_index(
        &self,
        tx: TransactionId,
        entity_id: EntityId,
        index_name: &str,
        column_ids: Vec<ColumnId>,
        method: IndexMethod,
        unique: bool,
    ) -> Result<catalog_types::IndexId> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }
        let table = entity.as_table().context(NotATableSnafu { entity: entity_id })?.clone();

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let placements = snapshot.placements_of(entity_id);
        for placement in &placements {
            let adapter = snapshot.adapter(placement.adapter_id)?;
            if !adapter.supports_index_method(method) {
                return UnsupportedIndexMethodSnafu { adapter: placement.adapter_id, method }.fail();
            }
            let covers_all = column_ids
                .iter()
                .all(|c| snapshot.columns_of_placement(placement.id).iter().any(|ac| ac.column_id == *c));
            if !covers_all {
                return IndexColumnsNotPlacedSnafu { entity: entity_id }.fail();
            }
        }

        let index_id = catalog_types::IndexId::new(self.catalog.sequences().next_val(sequence_names::INDEX));
        let index = Index { id: index_id, name: index_name.to_string(), entity_id, column_ids: column_ids.clone(), method, unique };

        let mut updated_entity = entity.clone();
        let mut updated_table = table;
        updated_table.indexes.push(index.clone());
        updated_entity.kind = LogicalEntityKind::Table(updated_table);

        let mut builder = self.catalog.new_builder();
        builder.insert_entity(updated_entity);
        self.publish_checked(builder, entity_id)?;

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                let partition_ids: Vec<PartitionId> =
                    snapshot.allocs_of_placement(placement.id).iter().map(|a| a.partition_id).collect();
                handle
                    .add_index(tx, &index, &partition_ids)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "add_index" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        Ok(index_id)
    }

    pub async fn truncate_entity(&self, tx: TransactionId, entity_id: EntityId) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?.clone();
        if entity.is_source() {
            return SourceEntitySnafu { entity: entity_id }.fail();
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        for placement in snapshot.placements_of(entity_id) {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                handle
                    .truncate(tx, &entity)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "truncate" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    pub async fn drop_entity(&self, tx: TransactionId, entity_id: EntityId) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let entity = snapshot.entity(entity_id)?.clone();

        for (other_id, other) in snapshot.all_entities() {
            if other_id == entity_id {
                continue;
            }
            if let Some(table) = other.as_table() {
                for fk in &table.foreign_keys {
                    if fk.target_entity == entity_id {
                        return ForeignKeyPreventsRemovalSnafu { entity: entity_id, from: other_id, referencing: fk.name.clone() }.fail();
                    }
                }
            }
        }

        self.coordinator.lock(tx, entity_id, LockMode::Exclusive).await?;

        let placements = snapshot.placements_of(entity_id);
        let mut builder = self.catalog.new_builder();
        for placement in &placements {
            builder.remove_placement(placement.id);
        }
        for column in snapshot.columns_of_entity(entity_id) {
            builder.remove_column(column.id);
        }
        builder.clear_partition_property(entity_id);
        builder.remove_entity(entity_id);
        self.catalog.publish(builder.build());

        for placement in &placements {
            if let Some(handle) = self.catalog.adapter_handle(placement.adapter_id) {
                let partition_ids: Vec<PartitionId> =
                    snapshot.allocs_of_placement(placement.id).iter().map(|a| a.partition_id).collect();
                handle
                    .drop_table(tx, &entity, &partition_ids)
                    .await
                    .context(AdapterFailedSnafu { adapter: placement.adapter_id, entity: entity_id, phase: "drop_table" })?;
                self.coordinator.add_participant(tx, placement.adapter_id)?;
            }
        }

        self.invalidate_plan_cache();
        Ok(())
    }

    // ---- adapters -----------------------------------------------------

    pub fn register_adapter_descriptor(
        &self,
        unique_name: &str,
        is_persistent: bool,
        deploy_mode: DeployMode,
        available_index_methods: Vec<IndexMethod>,
        is_data_read_only: bool,
    ) -> Result<catalog_types::AdapterId> {
        let snapshot = self.catalog.current_snapshot();
        if snapshot.adapters().any(|a| a.unique_name == unique_name) {
            return AdapterAlreadyExistsSnafu { name: unique_name }.fail();
        }
        let id = self.catalog.next_adapter_id();
        let mut builder = self.catalog.new_builder();
        builder.insert_adapter(AdapterDescriptor {
            id,
            unique_name: unique_name.to_string(),
            is_persistent,
            deploy_mode,
            available_index_methods,
            is_data_read_only,
        });
        self.catalog.publish(builder.build());
        self.invalidate_plan_cache();
        Ok(id)
    }

    pub fn drop_adapter_descriptor(&self, name: &str) -> Result<()> {
        let snapshot = self.catalog.current_snapshot();
        let id = snapshot
            .adapters()
            .find(|a| a.unique_name == name)
            .context(AdapterNotFoundByNameSnafu { name })?
            .id;
        let mut builder = self.catalog.new_builder();
        builder.remove_adapter(id);
        self.catalog.publish(builder.build());
        self.catalog.unregister_adapter(id);
        self.invalidate_plan_cache();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog::{Adapter, AdapterError, PhysicalScan, Row, RowStream, WriteBatch};
    use catalog_types::{AdapterId, PolyType};
    use lock_manager::LockManager;
    use metric::Registry;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct MockAdapter {
        calls: Mutex<Vec<&'static str>>,
    }

    #[derive(Debug)]
    struct EmptyStream;

    #[async_trait]
    impl RowStream for EmptyStream {
        async fn next_batch(&mut self, _n: usize) -> std::result::Result<Vec<Row>, AdapterError> {
            Ok(vec![])
        }
        async fn close(&mut self) {}
    }

    #[async_trait]
    impl Adapter for MockAdapter {
        async fn create_table(&self, _tx: TransactionId, _entity: &LogicalEntity, _partition_ids: &[PartitionId]) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("create_table");
            Ok(())
        }
        async fn drop_table(&self, _tx: TransactionId, _entity: &LogicalEntity, _partition_ids: &[PartitionId]) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("drop_table");
            Ok(())
        }
        async fn truncate(&self, _tx: TransactionId, _entity: &LogicalEntity) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("truncate");
            Ok(())
        }
        async fn add_column(&self, _tx: TransactionId, _entity: &LogicalEntity, _column: &LogicalColumn) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("add_column");
            Ok(())
        }
        async fn drop_column(&self, _tx: TransactionId, _alloc_column: &AllocationColumn) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("drop_column");
            Ok(())
        }
        async fn update_column_type(
            &self,
            _tx: TransactionId,
            _alloc_column: &AllocationColumn,
            _new_type: PolyType,
            _old_type: PolyType,
        ) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn add_index(&self, _tx: TransactionId, _index: &Index, _partition_ids: &[PartitionId]) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("add_index");
            Ok(())
        }
        async fn drop_index(&self, _tx: TransactionId, _index: &Index, _partition_ids: &[PartitionId]) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn create_collection(&self, _tx: TransactionId, _entity: &LogicalEntity) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn create_graph(&self, _tx: TransactionId, _entity: &LogicalEntity) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn drop_graph(&self, _tx: TransactionId, _entity: &LogicalEntity) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn scan(&self, _tx: TransactionId, _plan: PhysicalScan) -> std::result::Result<Box<dyn RowStream>, AdapterError> {
            Ok(Box::new(EmptyStream))
        }
        async fn write_batch(&self, _tx: TransactionId, _batch: WriteBatch) -> std::result::Result<(), AdapterError> {
            self.calls.lock().unwrap().push("write_batch");
            Ok(())
        }
        async fn commit(&self, _tx: TransactionId) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
        async fn rollback(&self, _tx: TransactionId) -> std::result::Result<(), AdapterError> {
            Ok(())
        }
    }

    fn harness() -> (Arc<Catalog>, DdlOrchestrator) {
        let catalog = Arc::new(Catalog::new());
        let locks = Arc::new(LockManager::new(Arc::new(poly_time::SystemProvider::new()), &Registry::new()));
        let coordinator = Arc::new(TransactionCoordinator::new(Arc::clone(&catalog), locks));
        let migrator = Arc::new(DataMigrator::new(Arc::clone(&catalog)));
        let ddl = DdlOrchestrator::new(Arc::clone(&catalog), coordinator, migrator);
        (catalog, ddl)
    }

    fn register_adapter(ddl: &DdlOrchestrator, catalog: &Catalog, name: &str) -> AdapterId {
        let id = ddl
            .register_adapter_descriptor(name, true, DeployMode::Embedded, vec![IndexMethod::BTree], false)
            .unwrap();
        catalog.register_adapter(id, Arc::new(MockAdapter::default()));
        id
    }

    #[tokio::test]
    async fn create_namespace_then_reject_duplicate() {
        let (_, ddl) = harness();
        ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        assert!(ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.is_err());
        assert!(ddl.create_namespace("public", NamespaceKind::Relational, "admin", true).await.is_ok());
    }

    #[tokio::test]
    async fn create_table_registers_columns_and_placement() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(
                tx,
                ns,
                "widgets",
                vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0"), ColumnSpec::new("name", PolyType::Varchar)],
                &["id".to_string()],
                &[adapter_id],
            )
            .await
            .unwrap();

        let snapshot = catalog.current_snapshot();
        assert_eq!(snapshot.entity(entity_id).unwrap().name, "widgets");
        assert_eq!(snapshot.columns_of_entity(entity_id).len(), 2);
        assert_eq!(snapshot.placements_of(entity_id).len(), 1);
    }

    #[tokio::test]
    async fn add_and_drop_column_round_trip() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(tx, ns, "widgets", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_id])
            .await
            .unwrap();

        let column_id = ddl.add_column(tx, entity_id, ColumnSpec::new("label", PolyType::Varchar)).await.unwrap();
        assert_eq!(catalog.current_snapshot().columns_of_entity(entity_id).len(), 2);

        ddl.drop_column(tx, entity_id, column_id).await.unwrap();
        assert_eq!(catalog.current_snapshot().columns_of_entity(entity_id).len(), 1);
    }

    #[tokio::test]
    async fn drop_column_rejects_primary_key_column() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(
                tx,
                ns,
                "widgets",
                vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0"), ColumnSpec::new("name", PolyType::Varchar)],
                &["id".to_string()],
                &[adapter_id],
            )
            .await
            .unwrap();
        let pk_column = catalog.current_snapshot().columns_of_entity(entity_id)[0].id;

        assert!(ddl.drop_column(tx, entity_id, pk_column).await.is_err());
    }

    #[tokio::test]
    async fn add_placement_migrates_existing_columns() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_a = register_adapter(&ddl, &catalog, "store_a");
        let adapter_b = register_adapter(&ddl, &catalog, "store_b");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(tx, ns, "widgets", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_a])
            .await
            .unwrap();

        let placement_id = ddl.add_placement(tx, entity_id, adapter_b, None, None, false).await.unwrap();
        let snapshot = catalog.current_snapshot();
        assert_eq!(snapshot.placements_of(entity_id).len(), 2);
        assert!(snapshot.placement(placement_id).is_ok());
    }

    #[tokio::test]
    async fn add_placement_rejects_manual_pk_placement_without_override() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_a = register_adapter(&ddl, &catalog, "store_a");
        let adapter_b = register_adapter(&ddl, &catalog, "store_b");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(tx, ns, "widgets", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_a])
            .await
            .unwrap();
        let pk_column = catalog.current_snapshot().columns_of_entity(entity_id)[0].id;

        let result = ddl.add_placement(tx, entity_id, adapter_b, Some(vec![pk_column]), None, false).await;
        assert!(result.is_err());

        let placement_id = ddl
            .add_placement(tx, entity_id, adapter_b, Some(vec![pk_column]), None, true)
            .await
            .unwrap();
        assert!(catalog.current_snapshot().placement(placement_id).is_ok());
    }

    #[tokio::test]
    async fn drop_last_placement_is_rejected() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(tx, ns, "widgets", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_id])
            .await
            .unwrap();
        let placement_id = catalog.current_snapshot().placements_of(entity_id)[0].id;

        assert!(ddl.drop_placement(tx, entity_id, placement_id).await.is_err());
    }

    #[tokio::test]
    async fn partition_entity_hash_then_merge_back() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(tx, ns, "widgets", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_id])
            .await
            .unwrap();
        let column_id = catalog.current_snapshot().columns_of_entity(entity_id)[0].id;

        ddl.partition_entity(tx, entity_id, column_id, PartitionSpec::Hash { count: 4 }).await.unwrap();
        let property = catalog.current_snapshot().partition_property(entity_id).cloned().unwrap();
        assert_eq!(property.partition_ids().len(), 4);

        ddl.merge_partitions(tx, entity_id).await.unwrap();
        let property = catalog.current_snapshot().partition_property(entity_id).cloned().unwrap();
        assert_eq!(property.partition_ids().len(), 1);
    }

    #[tokio::test]
    async fn add_index_succeeds_when_columns_are_placed() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let entity_id = ddl
            .create_table(
                tx,
                ns,
                "widgets",
                vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0"), ColumnSpec::new("name", PolyType::Varchar)],
                &["id".to_string()],
                &[adapter_id],
            )
            .await
            .unwrap();
        let name_column = catalog.current_snapshot().columns_of_entity(entity_id)[1].id;

        let index_id = ddl
            .add_index(tx, entity_id, "widgets_name_idx", vec![name_column], IndexMethod::BTree, false)
            .await
            .unwrap();
        let snapshot = catalog.current_snapshot();
        let table = snapshot.entity(entity_id).unwrap().as_table().unwrap();
        assert!(table.indexes.iter().any(|ix| ix.id == index_id));
    }

    #[tokio::test]
    async fn drop_entity_rejected_while_foreign_key_references_it() {
        let (catalog, ddl) = harness();
        let ns = ddl.create_namespace("public", NamespaceKind::Relational, "admin", false).await.unwrap();
        let adapter_id = register_adapter(&ddl, &catalog, "store1");
        let tx = TransactionId::new(1);
        let parent_id = ddl
            .create_table(tx, ns, "parent", vec![ColumnSpec::new("id", PolyType::BigInt).not_null("0")], &["id".to_string()], &[adapter_id])
            .await
            .unwrap();
        let child_id = ddl
            .create_table(
                tx,
                ns,
                "child",
                vec![ColumnSpec::new("parent_id", PolyType::BigInt).not_null("0")],
                &["parent_id".to_string()],
                &[adapter_id],
            )
            .await
            .unwrap();

        let parent_pk = catalog.current_snapshot().columns_of_entity(parent_id)[0].id;
        let child_col = catalog.current_snapshot().columns_of_entity(child_id)[0].id;

        let mut builder = catalog.new_builder();
        let mut entity = catalog.current_snapshot().entity(child_id).unwrap().clone();
        entity.as_table_mut().unwrap().foreign_keys.push(catalog_types::ForeignKey {
            id: catalog_types::ConstraintId::new(1),
            name: "fk_parent".to_string(),
            source_entity: child_id,
            source_cols: vec![child_col],
            target_entity: parent_id,
            target_cols: vec![parent_pk],
            on_update: catalog_types::ReferentialAction::Restrict,
            on_delete: catalog_types::ReferentialAction::Restrict,
        });
        builder.insert_entity(entity);
        catalog.publish(builder.build());

        assert!(ddl.drop_entity(tx, parent_id).await.is_err());

        ddl.drop_entity(tx, child_id).await.unwrap();
        ddl.drop_entity(tx, parent_id).await.unwrap();
    }

    #[tokio::test]
    async fn register_and_drop_adapter_descriptor() {
        let (catalog, ddl) = harness();
        let id = register_adapter(&ddl, &catalog, "store1");
        assert!(catalog.current_snapshot().adapter(id).is_ok());

        assert!(ddl.register_adapter_descriptor("store1", true, DeployMode::Embedded, vec![], false).is_err());

        ddl.drop_adapter_descriptor("store1").unwrap();
        assert!(catalog.current_snapshot().adapter(id).is_err());
    }
}
