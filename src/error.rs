use std::fmt;

/// Unified error type for the storage and execution core.
///
/// Variants map directly onto the error kinds the core is required to
/// distinguish: lock-timeout aborts are expected and recoverable by the
/// caller, everything else bubbles up as a fatal `DbException`.
#[derive(Debug)]
pub enum DbError {
    /// Raised by `PageLatch::acquire` on timeout. The caller is expected
    /// to call `BufferPool::transaction_complete(tid, false)`.
    TransactionAborted,
    /// Any non-transactional storage/operator failure: invalid page
    /// number, eviction with an all-dirty pool, closed iterator misuse.
    DbException(String),
    /// Propagated from disk I/O.
    Io(String),
    /// Requested an aggregate op a given aggregator variant doesn't
    /// support. Programming error, not data-driven.
    UnsupportedOperation(String),
    /// Iterator advanced past its end, or a catalog lookup missed.
    NoSuchElement,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DbError::TransactionAborted => write!(f, "transaction aborted"),
            DbError::DbException(msg) => write!(f, "{}", msg),
            DbError::Io(msg) => write!(f, "io error: {}", msg),
            DbError::UnsupportedOperation(msg) => {
                write!(f, "unsupported operation: {}", msg)
            }
            DbError::NoSuchElement => write!(f, "no such element"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Io(e.to_string())
    }
}

impl DbError {
    pub fn exception(msg: impl Into<String>) -> Self {
        DbError::DbException(msg.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;
