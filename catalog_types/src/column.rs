//! Logical columns and the (intentionally small) type tags the router and
//! migrator need. A full expression type system is out of scope — this only
//! carries what routing and migration consume.

use crate::ids::{ColumnId, EntityId};

/// Minimal polymorphic type tag for a logical column.
///
/// The full SQL/document/graph type system (precision rules, coercions,
/// built-in function signatures) is a collaborator reached through this
/// enum, not reimplemented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Real,
    Double,
    Varchar,
    Text,
    Date,
    Time,
    Timestamp,
    Binary,
    Json,
    /// An array/list of the given element type, used by DOCUMENT columns.
    Array(Box<PolyType>),
}

impl PolyType {
    /// Whether this type admits a total order suitable for RANGE partitioning.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, PolyType::Json | PolyType::Array(_) | PolyType::Binary)
    }
}

/// Collation for text-valued columns, following the usual case/accent
/// sensitivity split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Collation {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

/// A logical column, owned exclusively by its entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalColumn {
    pub id: ColumnId,
    pub entity_id: EntityId,
    pub name: String,
    /// Ordinal position within the entity, for display and default `SELECT *`
    /// ordering; independent of physical column order on any one placement.
    pub position: i32,
    pub poly_type: PolyType,
    /// Set when `poly_type` is `Array`: the element type, duplicated here
    /// for adapters that need a flat description instead of match-ing `PolyType`.
    pub collection_type: Option<PolyType>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub dimension: Option<i32>,
    pub cardinality: Option<i32>,
    pub nullable: bool,
    pub collation: Collation,
    pub default_value: Option<String>,
}

impl LogicalColumn {
    /// A minimal column with the engine's usual defaults: nullable,
    /// case-sensitive, no default.
    pub fn new(id: ColumnId, entity_id: EntityId, name: impl Into<String>, position: i32, poly_type: PolyType) -> Self {
        Self {
            id,
            entity_id,
            name: name.into(),
            position,
            poly_type,
            collection_type: None,
            precision: None,
            scale: None,
            dimension: None,
            cardinality: None,
            nullable: true,
            collation: Collation::default(),
            default_value: None,
        }
    }
}
