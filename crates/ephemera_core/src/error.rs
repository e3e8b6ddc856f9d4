//! Error types for storage capabilities and lifecycle operations.
use thiserror::Error;

/// Error raised by a metadata or blob storage capability.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The row or blob does not exist.
    #[error("Not found")]
    NotFound,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Size mismatch: expected {expected} bytes, received {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Record id '{0}' already exists")]
    Duplicate(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<redb::DatabaseError> for StorageError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}

/// Caller-visible error category. The transport maps each kind to exactly one
/// status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Expired,
    LimitExceeded,
    InvalidInput,
    StorageFailure,
}

/// Error returned by lifecycle operations.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Content has expired")]
    Expired,

    #[error("Download/view limit exceeded")]
    LimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} failed for '{id}': {source}")]
    Storage {
        operation: &'static str,
        id: String,
        #[source]
        source: StorageError,
    },

    /// A multi-step write failed and its compensating action failed too.
    #[error("{operation} failed for '{id}': {source} (rollback also failed: {rollback})")]
    RollbackFailed {
        operation: &'static str,
        id: String,
        #[source]
        source: StorageError,
        rollback: StorageError,
    },
}

impl AppError {
    /// Wrap a storage error with the operation and id it occurred on.
    ///
    /// A storage-level [`StorageError::NotFound`] becomes [`AppError::NotFound`];
    /// every other failure is kept verbatim as the source.
    pub fn storage(operation: &'static str, id: impl Into<String>, source: StorageError) -> Self {
        match source {
            StorageError::NotFound => Self::NotFound,
            source => Self::Storage {
                operation,
                id: id.into(),
                source,
            },
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Expired => ErrorKind::Expired,
            Self::LimitExceeded => ErrorKind::LimitExceeded,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Storage { .. } | Self::RollbackFailed { .. } => ErrorKind::StorageFailure,
        }
    }
}
