use catalog_types::{AdapterId, ColumnId, EntityId, NamespaceId, PlacementId};
use snafu::Snafu;

/// Catalog-level error taxonomy: lookups, name collisions, and the
/// invariant violations the catalog itself can detect while building a new
/// snapshot. `ddl` and `polydb` layer their own errors on top of this one.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("namespace \"{name}\" not found"))]
    NamespaceNotFound { name: String },

    #[snafu(display("entity {entity} not found"))]
    EntityNotFound { entity: EntityId },

    #[snafu(display("entity \"{namespace}.{name}\" not found"))]
    EntityNotFoundByName { namespace: String, name: String },

    #[snafu(display("column {column} not found"))]
    ColumnNotFound { column: ColumnId },

    #[snafu(display("adapter {adapter} not found"))]
    AdapterNotFound { adapter: AdapterId },

    #[snafu(display("placement {placement} not found"))]
    PlacementNotFound { placement: PlacementId },

    #[snafu(display("namespace \"{name}\" already exists"))]
    NamespaceAlreadyExists { name: String },

    #[snafu(display("entity \"{namespace}.{name}\" already exists"))]
    EntityAlreadyExists { namespace: String, name: String },

    #[snafu(display("column \"{name}\" already exists on entity {entity}"))]
    ColumnAlreadyExists { entity: EntityId, name: String },

    #[snafu(display("adapter \"{name}\" already deployed"))]
    AdapterAlreadyExists { name: String },

    #[snafu(display(
        "cannot drop placement {placement}: it is the last placement covering one or more columns of entity {entity}"
    ))]
    LastPlacement { entity: EntityId, placement: PlacementId },

    #[snafu(display(
        "cannot drop column {column}: it is referenced by an index, key, or constraint"
    ))]
    IndexPreventsRemoval { column: ColumnId },

    #[snafu(display("cannot drop the only column of entity {entity}"))]
    LastColumn { entity: EntityId },

    #[snafu(display(
        "allocation column for {column} on placement {placement} is MANUAL and is part of the primary key; PK placements must stay AUTOMATIC unless explicitly overridden"
    ))]
    PlacementIsPrimary { placement: PlacementId, column: ColumnId },

    #[snafu(display("placement {placement} is missing a required allocation column for {column}"))]
    MissingColumnPlacement { placement: PlacementId, column: ColumnId },

    #[snafu(display("entity {entity} is a SOURCE entity: structural DDL is rejected"))]
    UnsupportedOnSource { entity: EntityId },

    #[snafu(display(
        "cannot drop entity {entity}: foreign key {referencing} from entity {from} still references it"
    ))]
    ForeignKeyPreventsRemoval {
        entity: EntityId,
        from: EntityId,
        referencing: String,
    },

    #[snafu(display("{source}"))]
    Partition { source: partition_fn::Error },

    #[snafu(display("namespace {namespace} is not RELATIONAL"))]
    WrongNamespaceKind { namespace: NamespaceId },

    #[snafu(display("column {column} of entity {entity} has no allocation column on any placement"))]
    OrphanedColumn { entity: EntityId, column: ColumnId },

    #[snafu(display("partition {partition} of entity {entity} has no allocation entity on any placement"))]
    OrphanedPartition {
        entity: EntityId,
        partition: catalog_types::PartitionId,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<partition_fn::Error> for Error {
    fn from(source: partition_fn::Error) -> Self {
        Error::Partition { source }
    }
}
