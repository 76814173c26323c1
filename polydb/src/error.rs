//! The engine-wide error type: every collaborator's error folds into one
//! of the taxonomy kinds here, which in turn maps onto the CLI's exit
//! codes (0 ok, 1 usage, 2 catalog error, 3 adapter error, 4 deadlock).

use snafu::Snafu;

/// The taxonomy every error surfaces as, both to the CLI and in logs.
/// Distinct from the exit code: several kinds share exit code 2 (they are
/// all "the statement was rejected, nothing changed") while only a
/// deadlock or an adapter failure get their own code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvariantViolation,
    UnsupportedOnSource,
    PartitionError,
    ConstraintViolation,
    Deadlock,
    AdapterError,
    Cancelled,
    Usage,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Catalog { source: catalog::Error },

    #[snafu(display("{source}"))]
    Ddl { source: ddl::Error },

    #[snafu(display("{source}"))]
    Router { source: router::Error },

    #[snafu(display("{source}"))]
    Migrate { source: migrator::Error },

    #[snafu(display("{source}"))]
    Transaction { source: txn::Error },

    #[snafu(display("{source}"))]
    Lock { source: lock_manager::Error },

    #[snafu(display("invalid configuration: {message}"))]
    Config { message: String },

    #[snafu(display("{message}"))]
    Usage { message: String },

    #[snafu(display("failed to read catalog file {path}: {message}"))]
    CatalogIo { path: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The taxonomy kind this error belongs to, per the error handling
    /// design: every error is one of nine kinds regardless of which crate
    /// originated it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Catalog { source } => catalog_error_kind(source),
            Error::Ddl { source } => ddl_error_kind(source),
            Error::Router { source } => router_error_kind(source),
            Error::Migrate { .. } => ErrorKind::AdapterError,
            Error::Transaction { source } => match source {
                txn::Error::Lock { .. } => ErrorKind::Deadlock,
                txn::Error::AdapterFailed { .. } => ErrorKind::AdapterError,
                txn::Error::UnknownTransaction { .. } => ErrorKind::Usage,
            },
            Error::Lock { .. } => ErrorKind::Deadlock,
            Error::Config { .. } | Error::Usage { .. } | Error::CatalogIo { .. } => ErrorKind::Usage,
        }
    }

    /// The process exit code the CLI reports for this error: 1 usage, 2
    /// catalog error, 3 adapter error, 4 deadlock. Every other taxonomy
    /// kind (not-found, already-exists, invariant violation, partition
    /// error, constraint violation, cancelled) is a rejected statement and
    /// shares the catalog-error code since nothing was mutated.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage => 1,
            ErrorKind::Deadlock => 4,
            ErrorKind::AdapterError => 3,
            _ => 2,
        }
    }
}

fn catalog_error_kind(source: &catalog::Error) -> ErrorKind {
    use catalog::Error::*;
    match source {
        NamespaceNotFound { .. }
        | EntityNotFound { .. }
        | EntityNotFoundByName { .. }
        | ColumnNotFound { .. }
        | AdapterNotFound { .. }
        | PlacementNotFound { .. } => ErrorKind::NotFound,
        NamespaceAlreadyExists { .. } | EntityAlreadyExists { .. } | ColumnAlreadyExists { .. } | AdapterAlreadyExists { .. } => {
            ErrorKind::AlreadyExists
        }
        UnsupportedOnSource { .. } => ErrorKind::UnsupportedOnSource,
        Partition { .. } => ErrorKind::PartitionError,
        LastPlacement { .. }
        | IndexPreventsRemoval { .. }
        | LastColumn { .. }
        | PlacementIsPrimary { .. }
        | MissingColumnPlacement { .. }
        | ForeignKeyPreventsRemoval { .. }
        | WrongNamespaceKind { .. }
        | OrphanedColumn { .. }
        | OrphanedPartition { .. } => ErrorKind::InvariantViolation,
    }
}

fn ddl_error_kind(source: &ddl::Error) -> ErrorKind {
    use ddl::Error::*;
    match source {
        Catalog { source } => catalog_error_kind(source),
        Lock { .. } => ErrorKind::Deadlock,
        Migrate { .. } => ErrorKind::AdapterError,
        Partition { .. } => ErrorKind::PartitionError,
        Transaction { source } => match source {
            txn::Error::Lock { .. } => ErrorKind::Deadlock,
            txn::Error::AdapterFailed { .. } => ErrorKind::AdapterError,
            txn::Error::UnknownTransaction { .. } => ErrorKind::Usage,
        },
        AdapterFailed { .. } => ErrorKind::AdapterError,
        NamespaceAlreadyExists { .. }
        | EntityAlreadyExists { .. }
        | ColumnAlreadyExists { .. }
        | AdapterAlreadyExists { .. } => ErrorKind::AlreadyExists,
        AdapterNotFoundByName { .. } | NamespaceNotFound { .. } => ErrorKind::NotFound,
        SourceEntity { .. } => ErrorKind::UnsupportedOnSource,
        NotNullWithoutDefault { .. }
        | LastColumn { .. }
        | ColumnInUse { .. }
        | PlacementAlreadyOnAdapter { .. }
        | LastPlacement { .. }
        | AlreadyPartitioned { .. }
        | NotPartitioned { .. }
        | ForeignKeyPreventsRemoval { .. }
        | IndexColumnsNotPlaced { .. }
        | NamespaceNotEmpty { .. }
        | NotATable { .. }
        | UnsupportedIndexMethod { .. } => ErrorKind::InvariantViolation,
        UnknownPartitionFunction { .. } | UnsupportedPartitionColumn { .. } => ErrorKind::PartitionError,
    }
}

fn router_error_kind(source: &router::Error) -> ErrorKind {
    use router::Error::*;
    match source {
        Catalog { source } => catalog_error_kind(source),
        Partition { .. } => ErrorKind::PartitionError,
        NoCoveringPlacement { .. } => ErrorKind::Cancelled,
        UnplacedColumn { .. } => ErrorKind::PartitionError,
        NoPartitions { .. } => ErrorKind::PartitionError,
    }
}

impl From<catalog::Error> for Error {
    fn from(source: catalog::Error) -> Self {
        Error::Catalog { source }
    }
}

impl From<ddl::Error> for Error {
    fn from(source: ddl::Error) -> Self {
        Error::Ddl { source }
    }
}

impl From<router::Error> for Error {
    fn from(source: router::Error) -> Self {
        Error::Router { source }
    }
}

impl From<migrator::Error> for Error {
    fn from(source: migrator::Error) -> Self {
        Error::Migrate { source }
    }
}

impl From<txn::Error> for Error {
    fn from(source: txn::Error) -> Self {
        Error::Transaction { source }
    }
}

impl From<lock_manager::Error> for Error {
    fn from(source: lock_manager::Error) -> Self {
        Error::Lock { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use catalog_types::EntityId;

    #[test]
    fn deadlock_maps_to_exit_code_four() {
        let err = Error::Lock {
            source: lock_manager::Error::Deadlock {
                transaction: catalog_types::TransactionId::new(1),
                entity: EntityId::new(1),
            },
        };
        assert_matches!(err.kind(), ErrorKind::Deadlock);
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn not_found_maps_to_exit_code_two() {
        let err = Error::Catalog { source: catalog::Error::EntityNotFound { entity: EntityId::new(1) } };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn usage_error_maps_to_exit_code_one() {
        let err = Error::Usage { message: "missing argument".to_string() };
        assert_eq!(err.exit_code(), 1);
    }
}
