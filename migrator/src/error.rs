use catalog::AdapterError;
use catalog_types::{AdapterId, EntityId};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Catalog { source: catalog::Error },

    #[snafu(display("{source}"))]
    Partition { source: partition_fn::Error },

    #[snafu(display("adapter {adapter} failed migrating data for entity {entity}: {source}"))]
    AdapterFailed { adapter: AdapterId, entity: EntityId, source: AdapterError },

    #[snafu(display("entity {entity} has no partition property to migrate against"))]
    NotPartitioned { entity: EntityId },
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
