use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for benchmark operations.
///
/// Each kind describes one category of failure so callers can tell a broken
/// storage backend apart from a failed post-condition or a misconfigured run.
///
/// # Examples
///
/// ```rust
/// use kvbench::errors::{BenchError, BenchResult, ErrorKind};
///
/// fn example() -> BenchResult<()> {
///     Err(BenchError::new("entropy source unavailable", ErrorKind::RandomSourceError))
/// }
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::RandomSourceError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The backend could not allocate its storage (temp directory, files, handles)
    InitializationError,
    /// The entropy source failed while generating a batch
    RandomSourceError,
    /// A stored value could not be materialised
    DecodeError,
    /// A post-condition of a benchmark phase did not hold
    AssertionFailure,
    /// The workload configuration is not usable
    InvalidConfig,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The store has already been closed
    StoreAlreadyClosed,
    /// Error from the wrapped storage engine
    BackendError,
    /// Generic IO error
    IOError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InitializationError => write!(f, "Initialization error"),
            ErrorKind::RandomSourceError => write!(f, "Random source error"),
            ErrorKind::DecodeError => write!(f, "Decode error"),
            ErrorKind::AssertionFailure => write!(f, "Assertion failure"),
            ErrorKind::InvalidConfig => write!(f, "Invalid configuration"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::IOError => write!(f, "IO error"),
        }
    }
}

/// Error type shared by the core, the adapters and the driver.
///
/// `BenchError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust
/// use kvbench::errors::{BenchError, ErrorKind};
///
/// let cause = BenchError::new("disk full", ErrorKind::IOError);
/// let err = BenchError::new_with_cause("setup failed", ErrorKind::InitializationError, cause);
/// assert_eq!(err.message(), "setup failed");
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct BenchError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<BenchError>>,
    backtrace: Backtrace,
}

impl BenchError {
    /// Creates a new `BenchError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        BenchError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new `BenchError` that wraps the error which caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: BenchError) -> Self {
        BenchError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    /// Builds an [`ErrorKind::AssertionFailure`] reporting what was expected
    /// and what was observed.
    pub fn assertion(what: &str, expected: impl Display, actual: impl Display) -> Self {
        BenchError::new(
            &format!("{}: expected {}, actual {}", what, expected, actual),
            ErrorKind::AssertionFailure,
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&BenchError> {
        self.cause.as_deref()
    }
}

impl Display for BenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for BenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message with stack trace, or message followed by its cause
        match &self.cause {
            Some(cause) => write!(
                f,
                "{} ({})\nCaused by: {:?}",
                self.message, self.error_kind, cause
            ),
            None => write!(f, "{} ({})\n{:?}", self.message, self.error_kind, self.backtrace),
        }
    }
}

impl Error for BenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<rand::Error> for BenchError {
    fn from(err: rand::Error) -> Self {
        BenchError::new(
            &format!("Problem reading random bytes: {}", err),
            ErrorKind::RandomSourceError,
        )
    }
}

impl From<String> for BenchError {
    fn from(msg: String) -> Self {
        BenchError::new(&msg, ErrorKind::InvalidOperation)
    }
}

impl From<&str> for BenchError {
    fn from(msg: &str) -> Self {
        BenchError::new(msg, ErrorKind::InvalidOperation)
    }
}
