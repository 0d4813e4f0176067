use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Strata operations.
///
/// The first four variants are the failure taxonomy a caller opening a store
/// has to handle. The rest describe where a lower-level failure came from and
/// usually travel as the `cause` of one of the first four.
///
/// # Examples
///
/// ```rust,ignore
/// use strata::errors::{ErrorKind, StrataError, StrataResult};
///
/// fn example() -> StrataResult<()> {
///     Err(StrataError::new("Thresholds out of order", ErrorKind::ConfigurationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Open Errors
    /// The store could not be acquired (bad secret, corruption, already open)
    OpenFailure,

    // Migration Errors
    /// The store is newer than the code opening it
    UnsupportedDowngrade { from: u32, to: u32 },
    /// The step registered at `threshold` failed and the run was rolled back
    MigrationFailed { threshold: u32 },
    /// Step thresholds are zero, duplicated or out of order
    ConfigurationError,

    // Security Errors
    /// The supplied secret did not match the stored verifier
    SecurityError,

    // Backend and Store Errors
    /// Error from the storage backend
    BackendError,
    /// Store has not been opened yet
    StoreNotInitialized,
    /// Store has already been closed
    StoreAlreadyClosed,
    /// A named table or entry does not exist
    NotFound,
    /// A unique constraint was violated
    UniqueConstraintViolation,

    // Operation Errors
    /// The operation is not valid in the current state
    InvalidOperation,

    // IO Errors
    /// Generic IO error
    IOError,
    /// The disk is full
    DiskFull,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,

    // Data Errors
    /// Error encoding or decoding data
    EncodingError,
    /// Generic validation error
    ValidationError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::OpenFailure => write!(f, "Open failure"),
            ErrorKind::UnsupportedDowngrade { from, to } => {
                write!(f, "Unsupported downgrade from {} to {}", from, to)
            }
            ErrorKind::MigrationFailed { threshold } => {
                write!(f, "Migration failed at step {}", threshold)
            }
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::SecurityError => write!(f, "Security error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::DiskFull => write!(f, "Disk full"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Strata error type.
///
/// `StrataError` carries a message, a kind, an optional cause and the backtrace
/// captured where it was raised. Migration failures keep the failing step's
/// error as their cause so the caller can see both which step broke and why.
///
/// # Examples
///
/// ```rust,ignore
/// use strata::errors::{ErrorKind, StrataError};
///
/// let cause = StrataError::new("disk I/O error", ErrorKind::DiskFull);
/// let err = StrataError::migration_failed(9, cause);
/// assert_eq!(err.kind(), &ErrorKind::MigrationFailed { threshold: 9 });
/// ```
#[derive(Clone)]
pub struct StrataError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StrataError>>,
    backtrace: Atomic<Backtrace>,
}

impl StrataError {
    /// Creates a new `StrataError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `StrataError` wrapping `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StrataError) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Wraps a step failure so the caller sees the step threshold and the cause.
    pub fn migration_failed(threshold: u32, cause: StrataError) -> Self {
        StrataError::new_with_cause(
            &format!("Migration step {} failed: {}", threshold, cause.message()),
            ErrorKind::MigrationFailed { threshold },
            cause,
        )
    }

    /// Rejection of a store whose version is ahead of the target.
    pub fn unsupported_downgrade(from: u32, to: u32) -> Self {
        StrataError::new(
            &format!("Cannot migrate store from version {} down to {}", from, to),
            ErrorKind::UnsupportedDowngrade { from, to },
        )
    }

    /// Wraps any failure while acquiring a store.
    pub fn open_failure(message: &str, cause: StrataError) -> Self {
        StrataError::new_with_cause(message, ErrorKind::OpenFailure, cause)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StrataError> {
        self.cause.as_deref()
    }

    /// Walks the cause chain down to the innermost error.
    pub fn root_cause(&self) -> &StrataError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }
}

impl Display for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for StrataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// `StrataResult<T>` is shorthand for `Result<T, StrataError>`.
pub type StrataResult<T> = Result<T, StrataError>;

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        StrataError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::string::FromUtf8Error> for StrataError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        StrataError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::num::ParseIntError> for StrataError {
    fn from(err: std::num::ParseIntError) -> Self {
        StrataError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for StrataError {
    fn from(msg: String) -> Self {
        StrataError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StrataError {
    fn from(msg: &str) -> Self {
        StrataError::new(msg, ErrorKind::InternalError)
    }
}
