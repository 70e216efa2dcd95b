//! Integration tests for kvstack.
//!
//! Each test binds its own cluster on a fresh port of the process-wide
//! registry and talks to it through [`Client`], the same way the
//! `kvstack-basic-search` binary does.
//!
//! Run them with:
//! ```text
//! cargo test -p kvstack-integration
//! ```

use std::sync::Once;
use std::sync::atomic::{AtomicU16, Ordering};

use kvstack_core::{Client, ClusterAddr, ClusterRegistry, KvStackConfig};
use kvstack_model::{AttributeSet, AttributeValue};

static INIT: Once = Once::new();

static NEXT_PORT: AtomicU16 = AtomicU16::new(20_000);

/// Host every test cluster is bound to.
pub const TEST_HOST: &str = "localhost";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Reserve a port no other test in this process uses.
#[must_use]
pub fn next_port() -> u16 {
    NEXT_PORT.fetch_add(1, Ordering::Relaxed)
}

/// Bind a cluster with `config` on a fresh port and connect to it.
pub fn start_cluster_with(config: KvStackConfig) -> anyhow::Result<Client> {
    init_tracing();

    let port = next_port();
    ClusterRegistry::global().bind(ClusterAddr::new(TEST_HOST, port)?, config)?;
    Ok(Client::connect(TEST_HOST, port)?)
}

/// Bind a cluster with the default configuration and connect to it.
#[must_use]
pub fn start_cluster() -> Client {
    start_cluster_with(KvStackConfig::default())
        .unwrap_or_else(|e| panic!("failed to start cluster: {e:#}"))
}

/// Generate a unique space name for a test.
#[must_use]
pub fn test_space_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a space keyed by `k` and return its name.
pub fn create_test_space(client: &Client, prefix: &str) -> String {
    let name = test_space_name(prefix);
    client
        .add_space(&name, "k")
        .unwrap_or_else(|e| panic!("failed to create space {name}: {e}"));
    name
}

/// Build a record from `(attribute, value)` pairs.
#[must_use]
pub fn record<const N: usize>(pairs: [(&str, AttributeValue); N]) -> AttributeSet {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

mod test_client;
mod test_search;
