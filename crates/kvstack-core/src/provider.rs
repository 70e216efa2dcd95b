//! Store operations of one cluster.
//!
//! [`KvStackProvider`] validates requests, routes them to the right space and
//! converts internal errors into [`KvError`]s carrying a [`StatusCode`].
//!
//! [`StatusCode`]: kvstack_model::StatusCode

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use kvstack_model::{AttributeSet, KvError, Predicate};

use crate::config::KvStackConfig;
use crate::error::storage_error_to_kv;
use crate::state::{ClusterState, Space};

/// A cluster: its spaces plus the configuration they were created with.
#[derive(Debug)]
pub struct KvStackProvider {
    state: ClusterState,
    config: KvStackConfig,
    next_search_id: AtomicU64,
}

impl KvStackProvider {
    /// Create a cluster and the spaces listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSpace` if `config` lists a space twice.
    pub fn new(config: KvStackConfig) -> Result<Self, KvError> {
        let provider = Self {
            state: ClusterState::new(),
            config,
            next_search_id: AtomicU64::new(1),
        };
        for space in &provider.config.spaces {
            provider.handle_add_space(&space.name, &space.key_attribute)?;
        }
        Ok(provider)
    }

    /// Cluster state.
    #[must_use]
    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// Configuration this cluster was created with.
    #[must_use]
    pub fn config(&self) -> &KvStackConfig {
        &self.config
    }

    /// Allocate the id of a new search.
    pub fn next_search_id(&self) -> u64 {
        self.next_search_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a space.
    pub fn handle_add_space(&self, name: &str, key_attribute: &str) -> Result<(), KvError> {
        validate_space_name(name)?;
        if key_attribute.is_empty() {
            return Err(KvError::invalid_key("key attribute name must not be empty"));
        }
        self.state.create_space(Space::new(name, key_attribute))?;
        info!(space = name, key_attribute, "created space");
        Ok(())
    }

    /// Remove a space and all of its records.
    pub fn handle_remove_space(&self, name: &str) -> Result<(), KvError> {
        let space = self.state.drop_space(name)?;
        info!(
            space = name,
            records = space.storage.record_count(),
            "removed space"
        );
        Ok(())
    }

    /// Insert or replace a record.
    pub fn handle_put(
        &self,
        space: &str,
        key: &str,
        attributes: AttributeSet,
    ) -> Result<(), KvError> {
        let target = self.state.require_space(space)?;
        let replaced = target
            .storage
            .put(key, attributes)
            .map_err(storage_error_to_kv)?;
        debug!(space, key, replaced = replaced.is_some(), "put record");
        Ok(())
    }

    /// Fetch a record.
    pub fn handle_get(&self, space: &str, key: &str) -> Result<AttributeSet, KvError> {
        let target = self.state.require_space(space)?;
        target
            .storage
            .get(key)
            .ok_or_else(|| KvError::not_found(space, key))
    }

    /// Delete a record.
    pub fn handle_delete(&self, space: &str, key: &str) -> Result<(), KvError> {
        let target = self.state.require_space(space)?;
        target
            .storage
            .delete(key)
            .map(|_| ())
            .ok_or_else(|| KvError::not_found(space, key))
    }

    /// Run a search, returning matching `(key, record)` pairs ordered by key.
    pub fn handle_search(
        &self,
        space: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<(String, AttributeSet)>, KvError> {
        let target = self.state.require_space(space)?;
        target
            .storage
            .search(predicates, self.config.search_limit)
            .map_err(storage_error_to_kv)
    }
}

fn validate_space_name(name: &str) -> Result<(), KvError> {
    if name.is_empty() {
        return Err(KvError::unknown_space(name));
    }
    Ok(())
}
