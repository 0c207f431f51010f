//! Server configuration.
//!
//! Loaded from environment variables with defaults for everything.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheConfig;
use crate::mutator::MutatorConfig;
use crate::store::DocumentStoreConfig;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_SNAPSHOT: &str = "data/stations.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which station store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Seeded from the snapshot file and kept live by the mutator.
    #[default]
    Memory,
    /// A remote document store.
    Remote,
}

impl Backend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" | "local" => Some(Self::Memory),
            "remote" | "docstore" => Some(Self::Remote),
            _ => None,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub backend: Backend,
    /// Station snapshot used to seed the memory backend or import into the
    /// remote one.
    pub snapshot_path: PathBuf,
    /// Import the snapshot into the remote store at startup.
    pub import_snapshot: bool,
    pub cache: CacheConfig,
    pub mutator: MutatorConfig,
    pub document_store: DocumentStoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend: Backend::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT),
            import_snapshot: false,
            cache: CacheConfig::default(),
            mutator: MutatorConfig::default(),
            document_store: DocumentStoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        let bind = get("BIKESHARE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        config.bind = bind.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "BIKESHARE_BIND",
            value: bind.clone(),
            reason: "expected host:port",
        })?;

        if let Some(value) = get("BIKESHARE_BACKEND") {
            config.backend = Backend::parse(&value).ok_or(ConfigError::Invalid {
                key: "BIKESHARE_BACKEND",
                value,
                reason: "expected memory or remote",
            })?;
        }

        if let Some(path) = get("BIKESHARE_SNAPSHOT") {
            config.snapshot_path = PathBuf::from(path);
        }

        if let Some(value) = get("BIKESHARE_IMPORT") {
            config.import_snapshot = parse_flag("BIKESHARE_IMPORT", value)?;
        }

        if let Some(value) = get("BIKESHARE_CACHE_TTL_SECS") {
            config.cache = config.cache.with_ttl(parse_secs("BIKESHARE_CACHE_TTL_SECS", value)?);
        }

        if let Some(value) = get("BIKESHARE_MUTATOR_INTERVAL_SECS") {
            let interval = parse_secs("BIKESHARE_MUTATOR_INTERVAL_SECS", value)?;
            if interval.is_zero() {
                return Err(ConfigError::Invalid {
                    key: "BIKESHARE_MUTATOR_INTERVAL_SECS",
                    value: "0".to_string(),
                    reason: "must be positive",
                });
            }
            config.mutator = config.mutator.with_interval(interval);
        }

        let mut docs = config.document_store;
        if let Some(url) = get("DOCSTORE_URL") {
            docs.base_url = url;
        }
        if let Some(database) = get("DOCSTORE_DATABASE") {
            docs.database = database;
        }
        if let Some(container) = get("DOCSTORE_CONTAINER") {
            docs.container = container;
        }
        if let Some(key) = get("DOCSTORE_KEY") {
            docs = docs.with_api_key(key);
        }
        if let Some(value) = get("DOCSTORE_TIMEOUT_SECS") {
            docs = docs.with_timeout(parse_secs("DOCSTORE_TIMEOUT_SECS", value)?);
        }
        config.document_store = docs;

        Ok(config)
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Invalid {
            key,
            value,
            reason: "expected whole seconds",
        })
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.snapshot_path, PathBuf::from("data/stations.json"));
        assert!(!config.import_snapshot);
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.mutator.interval, Duration::from_secs(15));
        assert_eq!(config.document_store.database, "DublinBikesDb");
        assert_eq!(config.document_store.api_key, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = load(&[
            ("BIKESHARE_BIND", "0.0.0.0:8080"),
            ("BIKESHARE_BACKEND", "Remote"),
            ("BIKESHARE_SNAPSHOT", "/srv/dublin.json"),
            ("BIKESHARE_IMPORT", "true"),
            ("BIKESHARE_CACHE_TTL_SECS", "30"),
            ("BIKESHARE_MUTATOR_INTERVAL_SECS", "2"),
            ("DOCSTORE_URL", "http://docs:9000"),
            ("DOCSTORE_DATABASE", "Bikes"),
            ("DOCSTORE_CONTAINER", "docks"),
            ("DOCSTORE_KEY", "secret"),
            ("DOCSTORE_TIMEOUT_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(config.snapshot_path, PathBuf::from("/srv/dublin.json"));
        assert!(config.import_snapshot);
        assert_eq!(config.cache.ttl, Duration::from_secs(30));
        assert_eq!(config.mutator.interval, Duration::from_secs(2));
        assert_eq!(config.document_store.base_url, "http://docs:9000");
        assert_eq!(config.document_store.database, "Bikes");
        assert_eq!(config.document_store.container, "docks");
        assert_eq!(config.document_store.api_key.as_deref(), Some("secret"));
        assert_eq!(config.document_store.timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("BIKESHARE_BACKEND", "  "), ("DOCSTORE_KEY", "")]).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.document_store.api_key, None);
    }

    #[test]
    fn rejects_bad_values() {
        let err = load(&[("BIKESHARE_BACKEND", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIKESHARE_BACKEND", .. }));

        let err = load(&[("BIKESHARE_BIND", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIKESHARE_BIND", .. }));

        let err = load(&[("DOCSTORE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("DOCSTORE_TIMEOUT_SECS"));

        let err = load(&[("BIKESHARE_MUTATOR_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { reason: "must be positive", .. }));

        assert!(load(&[("BIKESHARE_IMPORT", "maybe")]).is_err());
    }

    #[test]
    fn backend_display() {
        assert_eq!(Backend::Memory.to_string(), "memory");
        assert_eq!(Backend::Remote.to_string(), "remote");
    }
}
