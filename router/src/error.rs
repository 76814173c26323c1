use catalog_types::{ColumnId, EntityId};
use snafu::Snafu;

/// Everything the router can fail on while planning one scan or DML
/// statement. A failed route is always recoverable by the caller (retry
/// under a different policy, or abort the statement) — nothing here is a
/// catalog mutation, so there is never anything to roll back.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Catalog { source: catalog::Error },

    #[snafu(display("{source}"))]
    Partition { source: partition_fn::Error },

    #[snafu(display(
        "no placement of entity {entity} covers the needed columns under the current router policy"
    ))]
    NoCoveringPlacement { entity: EntityId },

    #[snafu(display("column {column} of entity {entity} is not materialized on any placement"))]
    UnplacedColumn { entity: EntityId, column: ColumnId },

    #[snafu(display("entity {entity} has no partitions to route to"))]
    NoPartitions { entity: EntityId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<catalog::Error> for Error {
    fn from(source: catalog::Error) -> Self {
        Error::Catalog { source }
    }
}

impl From<partition_fn::Error> for Error {
    fn from(source: partition_fn::Error) -> Self {
        Error::Partition { source }
    }
}
