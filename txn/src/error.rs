use catalog::AdapterError;
use catalog_types::{AdapterId, TransactionId};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("transaction {tx} is not open"))]
    UnknownTransaction { tx: TransactionId },

    #[snafu(display("adapter {adapter} failed during {phase} of transaction {tx}: {source}"))]
    AdapterFailed {
        tx: TransactionId,
        adapter: AdapterId,
        phase: &'static str,
        source: AdapterError,
    },

    #[snafu(display("lock acquisition failed: {source}"))]
    Lock { source: lock_manager::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<lock_manager::Error> for Error {
    fn from(source: lock_manager::Error) -> Self {
        Error::Lock { source }
    }
}
