use rusqlite::ErrorCode;
use strata::errors::{ErrorKind, StrataError};
use thiserror::Error;

/// Failures raised by the SQLite adapter before they are handed to strata.
#[derive(Error, Debug)]
pub enum SqliteAdapterError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Store is closed")]
    Closed,
    #[error("Database {0} is already open in this process")]
    AlreadyOpen(String),
    #[error("Stored schema version {0} is out of range")]
    InvalidVersion(i64),
}

impl SqliteAdapterError {
    /// The strata error kind this failure maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqliteAdapterError::Sqlite(err) => match err.sqlite_error_code() {
                Some(ErrorCode::NotADatabase)
                | Some(ErrorCode::CannotOpen)
                | Some(ErrorCode::AuthorizationForStatementDenied) => ErrorKind::OpenFailure,
                Some(ErrorCode::DiskFull) => ErrorKind::DiskFull,
                Some(ErrorCode::ConstraintViolation) => ErrorKind::UniqueConstraintViolation,
                _ => ErrorKind::BackendError,
            },
            SqliteAdapterError::Closed => ErrorKind::StoreAlreadyClosed,
            SqliteAdapterError::AlreadyOpen(_) => ErrorKind::OpenFailure,
            SqliteAdapterError::InvalidVersion(_) => ErrorKind::EncodingError,
        }
    }
}

impl From<SqliteAdapterError> for StrataError {
    fn from(err: SqliteAdapterError) -> Self {
        StrataError::new(&err.to_string(), err.kind())
    }
}

pub type SqliteAdapterResult<T> = Result<T, SqliteAdapterError>;

/// Logs and converts anything the adapter can fail with into a [`StrataError`].
pub(crate) fn to_strata_error(err: impl Into<SqliteAdapterError>) -> StrataError {
    let err = err.into();
    log::error!("{}", err);
    StrataError::from(err)
}
