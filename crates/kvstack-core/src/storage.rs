//! In-memory storage engine for a single space.
//!
//! Records are kept in a [`DashMap`] keyed by record key, so puts and gets on
//! different keys proceed without contention. Searches walk every record,
//! keep those matching all predicates and return them ordered by key.
//!
//! ```text
//! DashMap<RecordKey, StoredRecord>
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use kvstack_model::{AttributeSet, AttributeValue, Predicate};

use crate::predicate::{PredicateError, compile_all};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record key is empty.
    #[error("record key must not be empty")]
    EmptyKey,
    /// The record carries the space's key attribute as a regular attribute.
    #[error("attribute '{attr}' is the key attribute of this space")]
    KeyAttributeInRecord {
        /// The key attribute name.
        attr: String,
    },
    /// A search predicate was rejected.
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

// ---------------------------------------------------------------------------
// SpaceStorage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredRecord {
    attributes: AttributeSet,
}

/// Storage for all records of one space.
#[derive(Debug)]
pub struct SpaceStorage {
    /// Record key -> record.
    records: DashMap<String, StoredRecord>,
    /// Name under which the record key is addressed in predicates.
    key_attribute: String,
    /// Total number of records.
    record_count: AtomicU64,
    /// Approximate size of all records in bytes.
    total_size: AtomicU64,
}

impl SpaceStorage {
    /// Creates an empty storage whose records are keyed by `key_attribute`.
    #[must_use]
    pub fn new(key_attribute: impl Into<String>) -> Self {
        Self {
            records: DashMap::new(),
            key_attribute: key_attribute.into(),
            record_count: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
        }
    }

    /// Returns the key attribute name.
    #[must_use]
    pub fn key_attribute(&self) -> &str {
        &self.key_attribute
    }

    /// Returns the current record count.
    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.record_count.load(AtomicOrdering::Relaxed)
    }

    /// Returns the approximate size of all records in bytes.
    #[must_use]
    pub fn total_size_bytes(&self) -> u64 {
        self.total_size.load(AtomicOrdering::Relaxed)
    }

    /// Inserts or replaces the record stored under `key`.
    ///
    /// Returns the previous record if one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::EmptyKey` for an empty key, or
    /// `StorageError::KeyAttributeInRecord` if `attributes` contains the key
    /// attribute.
    pub fn put(
        &self,
        key: &str,
        attributes: AttributeSet,
    ) -> Result<Option<AttributeSet>, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        if attributes.contains_key(&self.key_attribute) {
            return Err(StorageError::KeyAttributeInRecord {
                attr: self.key_attribute.clone(),
            });
        }

        let new_size = calculate_record_size(key, &attributes);
        let old = self
            .records
            .insert(key.to_owned(), StoredRecord { attributes });

        if let Some(old) = old {
            let old_size = calculate_record_size(key, &old.attributes);
            self.total_size.fetch_add(new_size, AtomicOrdering::Relaxed);
            self.total_size.fetch_sub(old_size, AtomicOrdering::Relaxed);
            debug!(key, old_size, new_size, "replaced existing record");
            Ok(Some(old.attributes))
        } else {
            self.record_count.fetch_add(1, AtomicOrdering::Relaxed);
            self.total_size.fetch_add(new_size, AtomicOrdering::Relaxed);
            debug!(key, new_size, "inserted new record");
            Ok(None)
        }
    }

    /// Retrieves the record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<AttributeSet> {
        self.records.get(key).map(|r| r.attributes.clone())
    }

    /// Deletes the record stored under `key`, returning it if it existed.
    pub fn delete(&self, key: &str) -> Option<AttributeSet> {
        let (_, removed) = self.records.remove(key)?;

        let size = calculate_record_size(key, &removed.attributes);
        self.record_count.fetch_sub(1, AtomicOrdering::Relaxed);
        self.total_size.fetch_sub(size, AtomicOrdering::Relaxed);
        debug!(key, size, "deleted record");

        Some(removed.attributes)
    }

    /// Returns every record satisfying all `predicates`, ordered by key.
    ///
    /// An empty predicate list matches every record. At most `limit` records
    /// are returned when a limit is given.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Predicate` if a predicate fails validation; no
    /// records are examined in that case.
    pub fn search(
        &self,
        predicates: &[Predicate],
        limit: Option<usize>,
    ) -> Result<Vec<(String, AttributeSet)>, StorageError> {
        let compiled = compile_all(predicates)?;

        let mut matches: Vec<(String, AttributeSet)> = self
            .records
            .iter()
            .filter(|entry| {
                compiled.iter().all(|p| {
                    p.matches_record(&self.key_attribute, entry.key(), &entry.value().attributes)
                })
            })
            .map(|entry| (entry.key().clone(), entry.value().attributes.clone()))
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }

        debug!(
            predicates = predicates.len(),
            matched = matches.len(),
            "searched space"
        );
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Size helpers
// ---------------------------------------------------------------------------

/// Approximate size of a record: key plus attribute names plus values.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn calculate_record_size(key: &str, attributes: &AttributeSet) -> u64 {
    let attrs: u64 = attributes
        .iter()
        .map(|(name, value)| name.len() as u64 + calculate_value_size(value))
        .sum();
    key.len() as u64 + attrs
}

#[must_use]
fn calculate_value_size(value: &AttributeValue) -> u64 {
    match value {
        AttributeValue::String(s) => s.len() as u64,
        AttributeValue::Int(_) | AttributeValue::Float(_) => 8,
        AttributeValue::Bool(_) => 1,
        AttributeValue::Bytes(b) => b.len() as u64,
        AttributeValue::Map(m) => m
            .iter()
            .map(|(k, v)| calculate_value_size(k) + calculate_value_size(v))
            .sum(),
    }
}
