//! Error types for kvstack clusters, and conversions into store errors.

use kvstack_model::KvError;

use crate::predicate::PredicateError;
use crate::storage::StorageError;

/// Infrastructure error: configuration and cluster binding.
#[derive(Debug, thiserror::Error)]
pub enum KvStackError {
    /// Host or port cannot be used as a cluster address.
    #[error("invalid address {0}")]
    InvalidAddress(String),

    /// Another cluster is already bound to this address.
    #[error("address already in use: {0}")]
    AddressInUse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for kvstack infrastructure operations.
pub type KvStackResult<T> = Result<T, KvStackError>;

/// Convert a storage error into a store error carrying the matching status.
#[must_use]
pub fn storage_error_to_kv(e: StorageError) -> KvError {
    match e {
        StorageError::EmptyKey => KvError::invalid_key(e.to_string()),
        StorageError::KeyAttributeInRecord { .. } => KvError::dont_use_key(e.to_string()),
        StorageError::Predicate(p) => predicate_error_to_kv(p),
    }
}

/// Convert a predicate error into a store error carrying the matching status.
#[must_use]
pub fn predicate_error_to_kv(e: PredicateError) -> KvError {
    match e {
        PredicateError::RegexNotString { .. } => KvError::wrong_type(e.to_string()),
        PredicateError::InvalidRegex { .. } => {
            let message = e.to_string();
            KvError::invalid_predicate(message).with_source(e)
        }
        PredicateError::EmptyAttribute | PredicateError::UnsupportedOperand { .. } => {
            KvError::invalid_predicate(e.to_string())
        }
    }
}
