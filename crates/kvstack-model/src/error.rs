//! Store status codes and the structured store error.
//!
//! Every store operation completes with a [`StatusCode`]. Anything other than
//! [`StatusCode::Success`] is surfaced to callers as a [`KvError`].

use std::fmt;

/// Status returned by store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum StatusCode {
    /// The operation succeeded.
    Success,
    /// No record exists under the requested key.
    NotFound,
    /// A search has delivered all of its records.
    SearchDone,
    /// The named space does not exist.
    UnknownSpace,
    /// A space with this name already exists.
    DuplicateSpace,
    /// The record attributes include the space's key attribute.
    DontUseKey,
    /// The record key is empty or otherwise unusable.
    InvalidKey,
    /// A value has the wrong type for the requested operation.
    WrongType,
    /// A search predicate is malformed.
    InvalidPredicate,
    /// Unexpected internal failure.
    #[default]
    ServerError,
}

impl StatusCode {
    /// Returns the status string as reported to clients.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOTFOUND",
            Self::SearchDone => "SEARCHDONE",
            Self::UnknownSpace => "UNKNOWNSPACE",
            Self::DuplicateSpace => "DUPLICATESPACE",
            Self::DontUseKey => "DONTUSEKEY",
            Self::InvalidKey => "INVALIDKEY",
            Self::WrongType => "WRONGTYPE",
            Self::InvalidPredicate => "INVALIDPREDICATE",
            Self::ServerError => "SERVERERROR",
        }
    }

    /// Whether this status means the operation completed normally.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SearchDone)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed store operation.
#[derive(Debug)]
pub struct KvError {
    /// The status code.
    pub code: StatusCode,
    /// A human-readable error message.
    pub message: String,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KvError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for KvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl KvError {
    /// Create a new `KvError` from a status code.
    #[must_use]
    pub fn new(code: StatusCode) -> Self {
        Self {
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `KvError` with a custom message.
    #[must_use]
    pub fn with_message(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Space not found.
    #[must_use]
    pub fn unknown_space(space: &str) -> Self {
        Self::with_message(StatusCode::UnknownSpace, format!("space '{space}' does not exist"))
    }

    /// Space already exists.
    #[must_use]
    pub fn duplicate_space(space: &str) -> Self {
        Self::with_message(
            StatusCode::DuplicateSpace,
            format!("space '{space}' already exists"),
        )
    }

    /// Record not found.
    #[must_use]
    pub fn not_found(space: &str, key: &str) -> Self {
        Self::with_message(
            StatusCode::NotFound,
            format!("no record '{key}' in space '{space}'"),
        )
    }

    /// Key attribute used as a regular attribute.
    #[must_use]
    pub fn dont_use_key(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::DontUseKey, message)
    }

    /// Unusable record key.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::InvalidKey, message)
    }

    /// Wrong value type.
    #[must_use]
    pub fn wrong_type(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::WrongType, message)
    }

    /// Malformed predicate.
    #[must_use]
    pub fn invalid_predicate(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::InvalidPredicate, message)
    }

    /// Internal failure.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::ServerError, message)
    }
}

/// Create a `KvError` from a status code.
///
/// # Examples
///
/// ```
/// use kvstack_model::kv_error;
/// use kvstack_model::error::StatusCode;
///
/// let err = kv_error!(NotFound);
/// assert_eq!(err.code, StatusCode::NotFound);
///
/// let err = kv_error!(UnknownSpace, "no such space");
/// assert_eq!(err.message, "no such space");
/// ```
#[macro_export]
macro_rules! kv_error {
    ($code:ident) => {
        $crate::error::KvError::new($crate::error::StatusCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::KvError::with_message($crate::error::StatusCode::$code, $msg)
    };
}
