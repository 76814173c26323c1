//! Primary keys, foreign keys, unique constraints and indexes.

use crate::ids::{ColumnId, ConstraintId, EntityId, IndexId};

/// `ON UPDATE` / `ON DELETE` behavior for a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

/// `{entityId, orderedColumnIds[]}` — every placement of `entity_id` must
/// carry an allocation column for each id in `ordered_column_ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub entity_id: EntityId,
    pub ordered_column_ids: Vec<ColumnId>,
}

/// A foreign key from `source_cols` on `source_entity` to `target_cols` on
/// `target_entity`. Prevents dropping `target_entity` while it exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub id: ConstraintId,
    pub name: String,
    pub source_entity: EntityId,
    pub source_cols: Vec<ColumnId>,
    pub target_entity: EntityId,
    pub target_cols: Vec<ColumnId>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

/// A `UNIQUE` constraint over one or more columns of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueConstraint {
    pub id: ConstraintId,
    pub name: String,
    pub entity_id: EntityId,
    pub column_ids: Vec<ColumnId>,
}

/// Index method, limited to what `Adapter::available_index_methods`
/// advertises; the adapter contract rejects methods it doesn't support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexMethod {
    BTree,
    Hash,
}

/// A secondary index on an entity, created in the catalog and then
/// physically materialized on each covering placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub id: IndexId,
    pub name: String,
    pub entity_id: EntityId,
    pub column_ids: Vec<ColumnId>,
    pub method: IndexMethod,
    pub unique: bool,
}
