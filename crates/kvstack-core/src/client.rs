//! In-process client for kvstack clusters.
//!
//! [`Client::connect`] resolves `host:port` against a [`ClusterRegistry`].
//! Point operations run synchronously; [`Client::search`] runs on a spawned
//! tokio task and delivers its results on two channels, one for records and
//! one for errors. Both channels close when the search is done.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use kvstack_model::{AttributeSet, KvError, Predicate, StatusCode};

use crate::provider::KvStackProvider;
use crate::registry::{ClusterAddr, ClusterRegistry};

/// Client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The cluster cannot be reached.
    #[error("cannot connect to {host}:{port}: {reason}")]
    Connection {
        /// Requested host.
        host: String,
        /// Requested port.
        port: u16,
        /// Why the connection failed.
        reason: String,
    },

    /// The store answered with a non-success status.
    #[error(transparent)]
    Status(#[from] KvError),
}

impl ClientError {
    /// Store status of this error, if the store answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Connection { .. } => None,
            Self::Status(e) => Some(e.code),
        }
    }
}

/// One record delivered by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    /// Record key.
    pub key: String,
    /// Record attributes, without the key attribute.
    pub attributes: AttributeSet,
}

/// Everything a search delivered on both channels.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Records in delivery order.
    pub records: Vec<SearchRecord>,
    /// Errors in delivery order.
    pub errors: Vec<KvError>,
}

impl SearchOutcome {
    /// Whether the search delivered no errors.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Handle to a running search.
#[derive(Debug)]
pub struct SearchStream {
    id: u64,
    records: mpsc::UnboundedReceiver<SearchRecord>,
    errors: mpsc::UnboundedReceiver<KvError>,
}

impl SearchStream {
    /// Search id, unique per cluster.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next record, or `None` once the record channel has closed.
    pub async fn next_record(&mut self) -> Option<SearchRecord> {
        self.records.recv().await
    }

    /// Next error, or `None` once the error channel has closed.
    pub async fn next_error(&mut self) -> Option<KvError> {
        self.errors.recv().await
    }

    /// Drain both channels until both have closed.
    pub async fn drain(mut self) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut records_open = true;
        let mut errors_open = true;

        while records_open || errors_open {
            tokio::select! {
                record = self.records.recv(), if records_open => match record {
                    Some(record) => outcome.records.push(record),
                    None => records_open = false,
                },
                error = self.errors.recv(), if errors_open => match error {
                    Some(error) => outcome.errors.push(error),
                    None => errors_open = false,
                },
            }
        }

        outcome
    }
}

/// Connection to one cluster.
#[derive(Debug, Clone)]
pub struct Client {
    addr: ClusterAddr,
    cluster: Arc<KvStackProvider>,
}

impl Client {
    /// Connect to the cluster bound at `host:port` in the global registry.
    pub fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        Self::connect_with(ClusterRegistry::global(), host, port)
    }

    /// Connect to the cluster bound at `host:port` in `registry`.
    pub fn connect_with(
        registry: &ClusterRegistry,
        host: &str,
        port: u16,
    ) -> Result<Self, ClientError> {
        let connection_error = |reason: String| ClientError::Connection {
            host: host.to_owned(),
            port,
            reason,
        };

        let addr = ClusterAddr::new(host, port).map_err(|e| connection_error(e.to_string()))?;
        let Some(cluster) = registry.lookup(&addr) else {
            warn!(%addr, "no cluster bound");
            return Err(connection_error("unreachable".to_owned()));
        };

        debug!(%addr, "connected");
        Ok(Self { addr, cluster })
    }

    /// Address this client is connected to.
    #[must_use]
    pub fn addr(&self) -> &ClusterAddr {
        &self.addr
    }

    /// Create a space.
    pub fn add_space(&self, name: &str, key_attribute: &str) -> Result<(), ClientError> {
        Ok(self.cluster.handle_add_space(name, key_attribute)?)
    }

    /// Remove a space and its records.
    pub fn rm_space(&self, name: &str) -> Result<(), ClientError> {
        Ok(self.cluster.handle_remove_space(name)?)
    }

    /// Insert or replace the record stored under `key`.
    pub fn put(&self, space: &str, key: &str, attributes: AttributeSet) -> Result<(), ClientError> {
        Ok(self.cluster.handle_put(space, key, attributes)?)
    }

    /// Fetch the record stored under `key`.
    pub fn get(&self, space: &str, key: &str) -> Result<AttributeSet, ClientError> {
        Ok(self.cluster.handle_get(space, key)?)
    }

    /// Delete the record stored under `key`.
    pub fn del(&self, space: &str, key: &str) -> Result<(), ClientError> {
        Ok(self.cluster.handle_delete(space, key)?)
    }

    /// Start a search for records of `space` matching every predicate.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn search(&self, space: &str, predicates: Vec<Predicate>) -> SearchStream {
        let id = self.cluster.next_search_id();
        let (records_tx, records) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();

        let cluster = Arc::clone(&self.cluster);
        let space = space.to_owned();
        tokio::spawn(async move {
            match cluster.handle_search(&space, &predicates) {
                Ok(found) => {
                    let total = found.len();
                    for (key, attributes) in found {
                        if records_tx.send(SearchRecord { key, attributes }).is_err() {
                            debug!(id, "search receiver dropped");
                            return;
                        }
                    }
                    debug!(id, space = %space, total, "search done");
                }
                Err(e) => {
                    debug!(id, space = %space, code = %e.code, "search failed");
                    let _ = errors_tx.send(e);
                }
            }
        });

        SearchStream {
            id,
            records,
            errors,
        }
    }
}
