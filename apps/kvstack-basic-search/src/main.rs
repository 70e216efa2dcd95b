//! kvstack basic search check.
//!
//! Binds an embedded cluster at `host:port`, checks that searching the empty
//! space `kv` finds nothing, then stores records and verifies that searching
//! by attribute returns exactly the stored records.
//! Exits with status 1 on any connection error, store error or mismatch.
//!
//! # Usage
//!
//! ```text
//! kvstack-basic-search <host> <port>
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `KVSTACK_SPACES` | `kv:k` | Spaces created in the embedded cluster |
//! | `KVSTACK_SEARCH_LIMIT` | *(unset)* | Maximum records delivered per search |

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kvstack_core::{Client, ClusterAddr, ClusterRegistry, KvStackConfig, equal_sets};
use kvstack_model::{AttributeSet, AttributeValue, Predicate};

const SPACE: &str = "kv";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

fn parse_args() -> Result<(String, u16)> {
    let mut args = std::env::args().skip(1);
    let (Some(host), Some(port)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: kvstack-basic-search <host> <port>");
    };
    let port = port
        .parse::<u16>()
        .with_context(|| format!("invalid port: {port}"))?;
    Ok((host, port))
}

fn expected_record() -> AttributeSet {
    AttributeSet::from([("v".to_owned(), AttributeValue::from("v1"))])
}

/// Search `kv` for `v == "v1"` and check that exactly `expected` records come back.
async fn check_search(client: &Client, expected: usize) -> Result<()> {
    let outcome = client
        .search(SPACE, vec![Predicate::equals("v", "v1")])
        .drain()
        .await;

    if let Some(err) = outcome.errors.first() {
        anyhow::bail!("search reported an error: {err}");
    }
    if outcome.records.len() != expected {
        anyhow::bail!(
            "search returned {} records, expected {expected}",
            outcome.records.len()
        );
    }
    let wanted = expected_record();
    for record in &outcome.records {
        if !equal_sets(&record.attributes, &wanted) {
            anyhow::bail!("record '{}' does not match the stored attributes", record.key);
        }
    }

    info!(records = expected, "search returned the stored records");
    Ok(())
}

async fn run(host: &str, port: u16, config: KvStackConfig) -> Result<()> {
    let addr = ClusterAddr::new(host, port).context("invalid cluster address")?;
    ClusterRegistry::global()
        .bind(addr, config)
        .context("failed to start embedded cluster")?;

    let client = Client::connect(host, port).context("failed to connect")?;
    check_search(&client, 0).await?;

    client
        .put(SPACE, "key1", expected_record())
        .context("failed to put key1")?;
    check_search(&client, 1).await?;

    client
        .put(SPACE, "key2", expected_record())
        .context("failed to put key2")?;
    check_search(&client, 2).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = KvStackConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level)?;

    let (host, port) = parse_args()?;
    info!(%host, port, spaces = config.spaces.len(), "starting basic search check");

    if let Err(e) = run(&host, port, config).await {
        error!("basic search check failed: {e:#}");
        std::process::exit(1);
    }

    info!("basic search check passed");
    Ok(())
}
