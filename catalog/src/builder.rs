//! Stages a batch of mutations against a cloned copy of the current maps,
//! then materializes a new [`Snapshot`] in one shot. Nothing is visible to
//! readers until [`SnapshotBuilder::build`] hands the result to the
//! `Catalog`, which publishes it with a single `ArcSwap::store`.

use catalog_types::{
    AdapterDescriptor, AdapterId, AllocationColumn, AllocationEntity, AllocationPartition,
    ColumnId, EntityId, LogicalColumn, LogicalEntity, Namespace, NamespaceId, PartitionId,
    PartitionProperty, PlacementId,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::snapshot::{AllocationPlacement, Snapshot};

/// A mutable working copy of a [`Snapshot`]'s maps. Every insert/remove
/// clones only the one map it touches (the `Arc`s for everything else are
/// shared until `build` rewraps them), so a builder that only adds a
/// namespace never touches the column or placement maps at all.
#[derive(Debug)]
pub struct SnapshotBuilder {
    generation: u64,
    namespaces: HashMap<NamespaceId, Namespace>,
    namespace_names: HashMap<String, NamespaceId>,
    entities: HashMap<EntityId, LogicalEntity>,
    entity_names: HashMap<(NamespaceId, String), EntityId>,
    columns: HashMap<ColumnId, LogicalColumn>,
    adapters: HashMap<AdapterId, AdapterDescriptor>,
    placements: HashMap<PlacementId, AllocationPlacement>,
    placements_by_entity: HashMap<EntityId, Vec<PlacementId>>,
    allocation_columns: HashMap<PlacementId, Vec<AllocationColumn>>,
    allocation_entities: HashMap<(PlacementId, PartitionId), AllocationEntity>,
    partitions: HashMap<PartitionId, AllocationPartition>,
    partition_properties: HashMap<EntityId, PartitionProperty>,
}

impl SnapshotBuilder {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            generation: snapshot.generation,
            namespaces: (*snapshot.namespaces).clone(),
            namespace_names: (*snapshot.namespace_names).clone(),
            entities: (*snapshot.entities).clone(),
            entity_names: (*snapshot.entity_names).clone(),
            columns: (*snapshot.columns).clone(),
            adapters: (*snapshot.adapters).clone(),
            placements: (*snapshot.placements).clone(),
            placements_by_entity: (*snapshot.placements_by_entity).clone(),
            allocation_columns: (*snapshot.allocation_columns).clone(),
            allocation_entities: (*snapshot.allocation_entities).clone(),
            partitions: (*snapshot.partitions).clone(),
            partition_properties: (*snapshot.partition_properties).clone(),
        }
    }

    pub fn insert_namespace(&mut self, ns: Namespace) {
        self.namespace_names.insert(ns.name.clone(), ns.id);
        self.namespaces.insert(ns.id, ns);
    }

    pub fn remove_namespace(&mut self, id: NamespaceId) {
        if let Some(ns) = self.namespaces.remove(&id) {
            self.namespace_names.remove(&ns.name);
        }
    }

    pub fn insert_entity(&mut self, entity: LogicalEntity) {
        self.entity_names.insert((entity.namespace_id, entity.name.clone()), entity.id);
        self.entities.insert(entity.id, entity);
    }

    pub fn remove_entity(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.remove(&id) {
            self.entity_names.remove(&(entity.namespace_id, entity.name.clone()));
        }
        self.placements_by_entity.remove(&id);
        self.partition_properties.remove(&id);
        self.columns.retain(|_, c| c.entity_id != id);
    }

    pub fn insert_column(&mut self, column: LogicalColumn) {
        self.columns.insert(column.id, column);
    }

    pub fn remove_column(&mut self, id: ColumnId) {
        self.columns.remove(&id);
    }

    pub fn insert_adapter(&mut self, adapter: AdapterDescriptor) {
        self.adapters.insert(adapter.id, adapter);
    }

    pub fn remove_adapter(&mut self, id: AdapterId) {
        self.adapters.remove(&id);
    }

    pub fn insert_placement(&mut self, placement: AllocationPlacement) {
        self.placements_by_entity
            .entry(placement.logical_entity_id)
            .or_default()
            .push(placement.id);
        self.placements.insert(placement.id, placement);
    }

    pub fn remove_placement(&mut self, id: PlacementId) {
        if let Some(placement) = self.placements.remove(&id) {
            if let Some(list) = self.placements_by_entity.get_mut(&placement.logical_entity_id) {
                list.retain(|p| *p != id);
            }
        }
        self.allocation_columns.remove(&id);
        self.allocation_entities.retain(|(p, _), _| *p != id);
    }

    pub fn set_allocation_columns(&mut self, placement_id: PlacementId, cols: Vec<AllocationColumn>) {
        self.allocation_columns.insert(placement_id, cols);
    }

    pub fn insert_allocation_entity(&mut self, alloc: AllocationEntity) {
        self.allocation_entities
            .insert((alloc.placement_id, alloc.partition_id), alloc);
    }

    pub fn remove_allocation_entity(&mut self, placement_id: PlacementId, partition_id: PartitionId) {
        self.allocation_entities.remove(&(placement_id, partition_id));
    }

    pub fn insert_partition(&mut self, partition: AllocationPartition) {
        self.partitions.insert(partition.id, partition);
    }

    pub fn remove_partition(&mut self, id: PartitionId) {
        self.partitions.remove(&id);
    }

    pub fn set_partition_property(&mut self, entity_id: EntityId, property: PartitionProperty) {
        self.partition_properties.insert(entity_id, property);
    }

    pub fn clear_partition_property(&mut self, entity_id: EntityId) {
        self.partition_properties.remove(&entity_id);
    }

    /// Consume the builder, bump the generation counter, and freeze every
    /// map back into an `Arc` for publication.
    pub fn build(self) -> Snapshot {
        Snapshot {
            generation: self.generation + 1,
            namespaces: Arc::new(self.namespaces),
            namespace_names: Arc::new(self.namespace_names),
            entities: Arc::new(self.entities),
            entity_names: Arc::new(self.entity_names),
            columns: Arc::new(self.columns),
            adapters: Arc::new(self.adapters),
            placements: Arc::new(self.placements),
            placements_by_entity: Arc::new(self.placements_by_entity),
            allocation_columns: Arc::new(self.allocation_columns),
            allocation_entities: Arc::new(self.allocation_entities),
            partitions: Arc::new(self.partitions),
            partition_properties: Arc::new(self.partition_properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::NamespaceKind;

    #[test]
    fn insert_then_build_bumps_generation() {
        let base = Snapshot::default();
        let mut builder = SnapshotBuilder::from_snapshot(&base);
        builder.insert_namespace(Namespace {
            id: NamespaceId::new(1),
            name: "public".to_string(),
            kind: NamespaceKind::Relational,
            owner: "admin".to_string(),
        });
        let next = builder.build();
        assert_eq!(next.generation(), 1);
        assert!(next.namespace_by_name("public").is_ok());
    }

    #[test]
    fn remove_entity_also_drops_its_columns_and_property() {
        use catalog_types::{LogicalEntityKind, PolyType, PrimaryKey, Table};

        let base = Snapshot::default();
        let mut builder = SnapshotBuilder::from_snapshot(&base);
        let entity_id = EntityId::new(1);
        builder.insert_entity(LogicalEntity {
            id: entity_id,
            namespace_id: NamespaceId::new(1),
            name: "t".to_string(),
            kind: LogicalEntityKind::Table(Table {
                columns: vec![],
                primary_key: PrimaryKey { entity_id, ordered_column_ids: vec![] },
                foreign_keys: vec![],
                unique_constraints: vec![],
                indexes: vec![],
                is_source: false,
                materialized_view: None,
            }),
        });
        builder.insert_column(LogicalColumn::new(ColumnId::new(1), entity_id, "c", 0, PolyType::Integer));
        builder.set_partition_property(entity_id, PartitionProperty::None { partition_id: PartitionId::new(1) });

        builder.remove_entity(entity_id);
        let snapshot = builder.build();
        assert!(snapshot.entity(entity_id).is_err());
        assert!(snapshot.columns_of_entity(entity_id).is_empty());
        assert!(snapshot.partition_property(entity_id).is_none());
    }
}
