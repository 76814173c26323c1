//! The immutable, point-in-time view of the full logical + allocation
//! model. Readers clone a `Snapshot` cheaply — every
//! field is an `Arc`, so cloning only bumps reference counts — and never
//! see a half-applied change: a new snapshot is only published once every
//! map it touches has been rebuilt.

use catalog_types::{
    AdapterDescriptor, AdapterId, AllocationColumn, AllocationEntity, AllocationPartition,
    AllocationPlacement, ColumnId, EntityId, LogicalColumn, LogicalEntity, Namespace, NamespaceId,
    PartitionId, PartitionProperty, PlacementId, PlacementType,
};
use snafu::OptionExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{
    AdapterNotFoundSnafu, ColumnNotFoundSnafu, EntityNotFoundByNameSnafu, EntityNotFoundSnafu,
    NamespaceNotFoundSnafu, PlacementNotFoundSnafu, Result,
};

/// An immutable view of the catalog at one point in the commit history.
///
/// `generation` increases by exactly one on every publish; the Transaction
/// Coordinator uses it to tell whether a change committed after a
/// transaction's `begin()` snapshot was taken.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) generation: u64,
    pub(crate) namespaces: Arc<HashMap<NamespaceId, Namespace>>,
    pub(crate) namespace_names: Arc<HashMap<String, NamespaceId>>,
    pub(crate) entities: Arc<HashMap<EntityId, LogicalEntity>>,
    pub(crate) entity_names: Arc<HashMap<(NamespaceId, String), EntityId>>,
    pub(crate) columns: Arc<HashMap<ColumnId, LogicalColumn>>,
    pub(crate) adapters: Arc<HashMap<AdapterId, AdapterDescriptor>>,
    pub(crate) placements: Arc<HashMap<PlacementId, AllocationPlacement>>,
    pub(crate) placements_by_entity: Arc<HashMap<EntityId, Vec<PlacementId>>>,
    pub(crate) allocation_columns: Arc<HashMap<PlacementId, Vec<AllocationColumn>>>,
    pub(crate) allocation_entities: Arc<HashMap<(PlacementId, PartitionId), AllocationEntity>>,
    pub(crate) partitions: Arc<HashMap<PartitionId, AllocationPartition>>,
    pub(crate) partition_properties: Arc<HashMap<EntityId, PartitionProperty>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            namespaces: Arc::new(HashMap::new()),
            namespace_names: Arc::new(HashMap::new()),
            entities: Arc::new(HashMap::new()),
            entity_names: Arc::new(HashMap::new()),
            columns: Arc::new(HashMap::new()),
            adapters: Arc::new(HashMap::new()),
            placements: Arc::new(HashMap::new()),
            placements_by_entity: Arc::new(HashMap::new()),
            allocation_columns: Arc::new(HashMap::new()),
            allocation_entities: Arc::new(HashMap::new()),
            partitions: Arc::new(HashMap::new()),
            partition_properties: Arc::new(HashMap::new()),
        }
    }
}

impl Snapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(&id)
    }

    pub fn namespace_by_name(&self, name: &str) -> Result<&Namespace> {
        let id = self
            .namespace_names
            .get(name)
            .context(NamespaceNotFoundSnafu { name })?;
        Ok(self.namespaces.get(id).expect("name index must agree with store"))
    }

    pub fn entity(&self, id: EntityId) -> Result<&LogicalEntity> {
        self.entities.get(&id).context(EntityNotFoundSnafu { entity: id })
    }

    pub fn entity_by_name(&self, namespace_id: NamespaceId, name: &str) -> Result<&LogicalEntity> {
        let key = (namespace_id, name.to_string());
        let id = self.entity_names.get(&key).context(EntityNotFoundByNameSnafu {
            namespace: namespace_id.to_string(),
            name,
        })?;
        Ok(self.entities.get(id).expect("name index must agree with store"))
    }

    pub fn column(&self, id: ColumnId) -> Result<&LogicalColumn> {
        self.columns.get(&id).context(ColumnNotFoundSnafu { column: id })
    }

    /// Every column owned by `entity_id`, in the entity's declared order.
    pub fn columns_of_entity(&self, entity_id: EntityId) -> Vec<&LogicalColumn> {
        let mut cols: Vec<&LogicalColumn> = self
            .columns
            .values()
            .filter(|c| c.entity_id == entity_id)
            .collect();
        cols.sort_by_key(|c| c.position);
        cols
    }

    pub fn adapter(&self, id: AdapterId) -> Result<&AdapterDescriptor> {
        self.adapters.get(&id).context(AdapterNotFoundSnafu { adapter: id })
    }

    pub fn adapters(&self) -> impl Iterator<Item = &AdapterDescriptor> {
        self.adapters.values()
    }

    pub fn placement(&self, id: PlacementId) -> Result<&AllocationPlacement> {
        self.placements
            .get(&id)
            .context(PlacementNotFoundSnafu { placement: id })
    }

    /// Every placement of `entity_id`.
    pub fn placements_of(&self, entity_id: EntityId) -> Vec<&AllocationPlacement> {
        self.placements_by_entity
            .get(&entity_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.placements.get(id))
            .collect()
    }

    /// Every allocation entity (partition instance) realized on `placement_id`.
    pub fn allocs_of_placement(&self, placement_id: PlacementId) -> Vec<&AllocationEntity> {
        self.allocation_entities
            .iter()
            .filter(|((p, _), _)| *p == placement_id)
            .map(|(_, alloc)| alloc)
            .collect()
    }

    /// Every allocation column materialized on `placement_id`.
    pub fn columns_of_placement(&self, placement_id: PlacementId) -> &[AllocationColumn] {
        self.allocation_columns
            .get(&placement_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn alloc_by_partition(
        &self,
        placement_id: PlacementId,
        partition_id: PartitionId,
    ) -> Option<&AllocationEntity> {
        self.allocation_entities.get(&(placement_id, partition_id))
    }

    /// For every placement of `entity_id`, the set of logical column ids it
    /// carries, keyed by adapter — the shape the router's placement-cover
    /// search consumes directly.
    pub fn column_placements_by_adapter(
        &self,
        entity_id: EntityId,
    ) -> HashMap<AdapterId, Vec<ColumnId>> {
        let mut out: HashMap<AdapterId, Vec<ColumnId>> = HashMap::new();
        for placement in self.placements_of(entity_id) {
            let cols = self.columns_of_placement(placement.id);
            out.entry(placement.adapter_id)
                .or_default()
                .extend(cols.iter().map(|c| c.column_id));
        }
        out
    }

    pub fn partition_property(&self, entity_id: EntityId) -> Option<&PartitionProperty> {
        self.partition_properties.get(&entity_id)
    }

    pub fn partition(&self, id: PartitionId) -> Option<&AllocationPartition> {
        self.partitions.get(&id)
    }

    /// The allocation type of `placement_id`, used by the invariant check
    /// that rejects a MANUAL placement covering a primary-key column.
    pub fn placement_type(&self, placement_id: PlacementId) -> Option<PlacementType> {
        self.placements.get(&placement_id).map(|p| p.placement_type)
    }

    /// All namespaces, sorted by id, for listing/persistence.
    pub fn all_namespaces(&self) -> BTreeMap<NamespaceId, &Namespace> {
        self.namespaces.iter().map(|(id, ns)| (*id, ns)).collect()
    }

    /// All entities, sorted by id, for listing/persistence.
    pub fn all_entities(&self) -> BTreeMap<EntityId, &LogicalEntity> {
        self.entities.iter().map(|(id, e)| (*id, e)).collect()
    }
}
