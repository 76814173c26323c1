use catalog_types::{AdapterId, ColumnId, EntityId, IndexMethod, NamespaceId, PlacementId};
use snafu::Snafu;

/// Every way a schema-change operation can fail: the validate-phase checks
/// this crate owns, plus whatever its collaborators (catalog, lock manager,
/// migrator, partition functions, adapters) reject.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Catalog { source: catalog::Error },

    #[snafu(display("{source}"))]
    Lock { source: lock_manager::Error },

    #[snafu(display("{source}"))]
    Migrate { source: migrator::Error },

    #[snafu(display("{source}"))]
    Partition { source: partition_fn::Error },

    #[snafu(display("{source}"))]
    Transaction { source: txn::Error },

    #[snafu(display("adapter {adapter} failed during {phase} for entity {entity}: {source}"))]
    AdapterFailed {
        adapter: AdapterId,
        entity: EntityId,
        phase: &'static str,
        source: catalog::AdapterError,
    },

    #[snafu(display("namespace \"{name}\" already exists"))]
    NamespaceAlreadyExists { name: String },

    #[snafu(display("entity \"{name}\" already exists in namespace {namespace}"))]
    EntityAlreadyExists { namespace: NamespaceId, name: String },

    #[snafu(display("column \"{name}\" already exists on entity {entity}"))]
    ColumnAlreadyExists { entity: EntityId, name: String },

    #[snafu(display("adapter \"{name}\" is already deployed"))]
    AdapterAlreadyExists { name: String },

    #[snafu(display("no adapter named \"{name}\" is deployed"))]
    AdapterNotFoundByName { name: String },

    #[snafu(display("entity {entity} is a SOURCE entity: structural DDL is rejected"))]
    SourceEntity { entity: EntityId },

    #[snafu(display("column {column} must be NOT NULL but no DEFAULT was supplied"))]
    NotNullWithoutDefault { column: String },

    #[snafu(display("cannot drop the only column of entity {entity}"))]
    LastColumn { entity: EntityId },

    #[snafu(display("cannot drop column {column}: referenced by a primary key, foreign key, unique constraint or index"))]
    ColumnInUse { column: ColumnId },

    #[snafu(display("adapter {adapter} already hosts a placement for entity {entity}"))]
    PlacementAlreadyOnAdapter { entity: EntityId, adapter: AdapterId },

    #[snafu(display(
        "cannot drop placement {placement}: it is the last placement covering one or more columns or partitions of entity {entity}"
    ))]
    LastPlacement { entity: EntityId, placement: PlacementId },

    #[snafu(display("entity {entity} is already partitioned"))]
    AlreadyPartitioned { entity: EntityId },

    #[snafu(display("entity {entity} is not partitioned"))]
    NotPartitioned { entity: EntityId },

    #[snafu(display("unknown partition function \"{name}\""))]
    UnknownPartitionFunction { name: String },

    #[snafu(display("partition column {column} does not support the \"{function}\" partition function"))]
    UnsupportedPartitionColumn { column: ColumnId, function: String },

    #[snafu(display(
        "cannot drop entity {entity}: foreign key \"{referencing}\" on entity {from} still references it"
    ))]
    ForeignKeyPreventsRemoval {
        entity: EntityId,
        from: EntityId,
        referencing: String,
    },

    #[snafu(display("entity {entity} is a MATERIALIZED_VIEW or SOURCE table: index columns must already be placed on the target adapter"))]
    IndexColumnsNotPlaced { entity: EntityId },

    #[snafu(display("namespace \"{name}\" is not empty"))]
    NamespaceNotEmpty { name: String },

    #[snafu(display("no namespace with id {id}"))]
    NamespaceNotFound { id: NamespaceId },

    #[snafu(display("entity {entity} is not a table"))]
    NotATable { entity: EntityId },

    #[snafu(display("adapter {adapter} does not support index method {method:?}"))]
    UnsupportedIndexMethod { adapter: AdapterId, method: IndexMethod },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<catalog::Error> for Error {
    fn from(source: catalog::Error) -> Self {
        Error::Catalog { source }
    }
}

impl From<lock_manager::Error> for Error {
    fn from(source: lock_manager::Error) -> Self {
        Error::Lock { source }
    }
}

impl From<migrator::Error> for Error {
    fn from(source: migrator::Error) -> Self {
        Error::Migrate { source }
    }
}

impl From<partition_fn::Error> for Error {
    fn from(source: partition_fn::Error) -> Self {
        Error::Partition { source }
    }
}

impl From<txn::Error> for Error {
    fn from(source: txn::Error) -> Self {
        Error::Transaction { source }
    }
}
