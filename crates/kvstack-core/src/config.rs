//! Configuration for kvstack clusters.
//!
//! All configuration is driven by environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `KVSTACK_SPACES` | `kv:k` | Comma-separated `name[:key_attribute]` spaces created at bind |
//! | `KVSTACK_SEARCH_LIMIT` | *(unset)* | Maximum records delivered per search |

use serde::{Deserialize, Serialize};

use crate::error::KvStackError;

/// Key attribute used when a space spec names none.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "k";

/// Cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvStackConfig {
    /// Log level.
    pub log_level: String,
    /// Spaces created when a cluster is bound.
    pub spaces: Vec<SpaceConfig>,
    /// Maximum records delivered per search.
    pub search_limit: Option<usize>,
}

/// A space to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceConfig {
    /// Space name.
    pub name: String,
    /// Name of the attribute holding the record key.
    pub key_attribute: String,
}

impl SpaceConfig {
    /// Parse a `name[:key_attribute]` spec.
    ///
    /// # Errors
    ///
    /// Returns `KvStackError::Config` if the name or key attribute is empty.
    pub fn parse(spec: &str) -> Result<Self, KvStackError> {
        let (name, key_attribute) = match spec.split_once(':') {
            Some((name, key)) => (name.trim(), key.trim()),
            None => (spec.trim(), DEFAULT_KEY_ATTRIBUTE),
        };
        if name.is_empty() || key_attribute.is_empty() {
            return Err(KvStackError::Config(format!("invalid space spec '{spec}'")));
        }
        Ok(Self {
            name: name.to_owned(),
            key_attribute: key_attribute.to_owned(),
        })
    }
}

impl Default for KvStackConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            spaces: vec![SpaceConfig {
                name: "kv".to_owned(),
                key_attribute: DEFAULT_KEY_ATTRIBUTE.to_owned(),
            }],
            search_limit: None,
        }
    }
}

impl KvStackConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `KvStackError::Config` for a malformed variable.
    pub fn from_env() -> Result<Self, KvStackError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `KvStackError::Config` for a malformed variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, KvStackError> {
        let mut config = Self::default();

        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("KVSTACK_SPACES") {
            config.spaces = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(SpaceConfig::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = lookup("KVSTACK_SEARCH_LIMIT") {
            let limit = v.trim().parse::<usize>().map_err(|e| {
                KvStackError::Config(format!("invalid KVSTACK_SEARCH_LIMIT '{v}': {e}"))
            })?;
            config.search_limit = Some(limit);
        }

        Ok(config)
    }
}
