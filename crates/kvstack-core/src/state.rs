//! Cluster state: the set of spaces held by one store instance.

use std::sync::Arc;

use dashmap::DashMap;

use kvstack_model::KvError;

use crate::storage::SpaceStorage;

/// All spaces of one cluster, keyed by name.
#[derive(Debug)]
pub struct ClusterState {
    spaces: DashMap<String, Arc<Space>>,
}

impl ClusterState {
    /// Create a new empty cluster state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spaces: DashMap::new(),
        }
    }

    /// Get a space by name.
    #[must_use]
    pub fn get_space(&self, name: &str) -> Option<Arc<Space>> {
        self.spaces.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Get a space or return `UnknownSpace`.
    pub fn require_space(&self, name: &str) -> Result<Arc<Space>, KvError> {
        self.get_space(name)
            .ok_or_else(|| KvError::unknown_space(name))
    }

    /// Insert a new space. Returns `DuplicateSpace` if the name is taken.
    pub fn create_space(&self, space: Space) -> Result<Arc<Space>, KvError> {
        match self.spaces.entry(space.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(KvError::duplicate_space(e.key())),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let space = Arc::new(space);
                e.insert(Arc::clone(&space));
                Ok(space)
            }
        }
    }

    /// Remove a space by name. Returns the removed space.
    pub fn drop_space(&self, name: &str) -> Result<Arc<Space>, KvError> {
        self.spaces
            .remove(name)
            .map(|(_, s)| s)
            .ok_or_else(|| KvError::unknown_space(name))
    }

    /// List all space names (sorted).
    #[must_use]
    pub fn list_space_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.spaces.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for ClusterState {
    fn default() -> Self {
        Self::new()
    }
}

/// A named collection of records.
#[derive(Debug)]
pub struct Space {
    /// Space name.
    pub name: String,
    /// Record storage.
    pub storage: SpaceStorage,
}

impl Space {
    /// Create an empty space whose records are keyed by `key_attribute`.
    #[must_use]
    pub fn new(name: impl Into<String>, key_attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: SpaceStorage::new(key_attribute),
        }
    }

    /// Name of the key attribute.
    #[must_use]
    pub fn key_attribute(&self) -> &str {
        self.storage.key_attribute()
    }
}
