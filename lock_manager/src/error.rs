use catalog_types::{EntityId, TransactionId};
use snafu::Snafu;

/// Errors raised by lock acquisition.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "acquiring lock on entity {entity} by transaction {transaction} would deadlock"
    ))]
    Deadlock {
        transaction: TransactionId,
        entity: EntityId,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
