//! In-process registry of running clusters.
//!
//! Provides [`ClusterRegistry`], a thread-safe map from `(host, port)` to a
//! running cluster. Binding a cluster makes it reachable by
//! [`Client::connect`](crate::client::Client::connect); nothing crosses a
//! socket.

use std::fmt;
use std::sync::{Arc, LazyLock};

use anyhow::Context;
use dashmap::DashMap;
use tracing::{info, warn};

use crate::config::KvStackConfig;
use crate::error::{KvStackError, KvStackResult};
use crate::provider::KvStackProvider;

static GLOBAL: LazyLock<ClusterRegistry> = LazyLock::new(ClusterRegistry::new);

/// Address a cluster is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterAddr {
    host: String,
    port: u16,
}

impl ClusterAddr {
    /// Create an address.
    ///
    /// # Errors
    /// Returns `KvStackError::InvalidAddress` for an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> KvStackResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(KvStackError::InvalidAddress(format!(
                "{host}:{port} (empty host)"
            )));
        }
        if port == 0 {
            return Err(KvStackError::InvalidAddress(format!(
                "{host}:{port} (invalid port)"
            )));
        }
        Ok(Self { host, port })
    }

    /// Host part.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ClusterAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Thread-safe map of bound clusters.
///
/// # Examples
///
/// ```
/// use kvstack_core::config::KvStackConfig;
/// use kvstack_core::registry::{ClusterAddr, ClusterRegistry};
///
/// let registry = ClusterRegistry::new();
/// let addr = ClusterAddr::new("127.0.0.1", 1982).unwrap();
/// registry.bind(addr.clone(), KvStackConfig::default()).unwrap();
/// assert!(registry.lookup(&addr).is_some());
/// ```
#[derive(Debug)]
pub struct ClusterRegistry {
    inner: DashMap<ClusterAddr, Arc<KvStackProvider>>,
}

impl ClusterRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// The process-wide registry used by [`Client::connect`](crate::client::Client::connect).
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Start a cluster at `addr`, creating the spaces listed in `config`.
    ///
    /// # Errors
    /// Returns `KvStackError::AddressInUse` if a cluster is already bound to
    /// `addr`, or `KvStackError::Internal` if the configured spaces cannot be
    /// created.
    pub fn bind(
        &self,
        addr: ClusterAddr,
        config: KvStackConfig,
    ) -> KvStackResult<Arc<KvStackProvider>> {
        match self.inner.entry(addr) {
            dashmap::mapref::entry::Entry::Occupied(e) => {
                warn!(addr = %e.key(), "cluster address already in use");
                Err(KvStackError::AddressInUse(e.key().to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let provider = KvStackProvider::new(config)
                    .with_context(|| format!("failed to start cluster at {}", e.key()))?;
                let provider = Arc::new(provider);
                info!(
                    addr = %e.key(),
                    spaces = ?provider.state().list_space_names(),
                    "cluster bound"
                );
                e.insert(Arc::clone(&provider));
                Ok(provider)
            }
        }
    }

    /// Get the cluster bound to `addr`, if any.
    #[must_use]
    pub fn lookup(&self, addr: &ClusterAddr) -> Option<Arc<KvStackProvider>> {
        self.inner.get(addr).map(|v| Arc::clone(v.value()))
    }

    /// Stop serving `addr`. Existing clients keep their handle.
    #[must_use]
    pub fn unbind(&self, addr: &ClusterAddr) -> Option<Arc<KvStackProvider>> {
        let removed = self.inner.remove(addr).map(|(_, v)| v);
        if removed.is_some() {
            info!(%addr, "cluster unbound");
        }
        removed
    }

    /// Number of bound clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no cluster is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ClusterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
