//! Configuration for datasvc

use serde::Deserialize;
use std::fmt;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub mongo: MongoConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen_addr: String,

    /// Number of Tokio worker threads (0 = number of CPUs)
    pub worker_threads: usize,

    /// Development mode (verbose logging)
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            worker_threads: 0,
            dev_mode: false,
        }
    }
}

/// Document store (MongoDB) configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Connection string; its path names the database
    pub uri: String,

    /// Explicit database name, overriding the one in `uri`
    pub database: Option<String>,

    /// Collection holding the records
    pub collection: String,

    /// Server selection timeout in seconds
    pub server_selection_timeout_secs: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/microservices".to_string(),
            database: None,
            collection: "data".to_string(),
            server_selection_timeout_secs: 5,
        }
    }
}

// Hand-written so credentials in the URI never reach the logs
impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &redact_uri(&self.uri))
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field(
                "server_selection_timeout_secs",
                &self.server_selection_timeout_secs,
            )
            .finish()
    }
}

/// Replace the userinfo part of a connection string with `***`
pub fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &uri[..scheme_end + 3], &rest[at..]),
        None => uri.to_string(),
    }
}

/// Cache (Redis) connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,

    /// Give up on a connection attempt after this many milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            connect_timeout_ms: 2000,
        }
    }
}

impl RedisConfig {
    /// Connection URL for the redis client
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

/// Read-through cache policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Key holding the full collection snapshot
    pub key: String,

    /// Snapshot time-to-live in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: "api_data".to_string(),
            ttl_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::ServiceError::Config(format!("Failed to read config file: {e}"))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::ServiceError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables or use defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(uri) = lookup("MONGO_URI") {
            config.mongo.uri = uri;
        }

        if let Some(host) = lookup("REDIS_HOST") {
            config.redis.host = host;
        }

        if let Some(port) = lookup("REDIS_PORT")
            && let Ok(n) = port.parse()
        {
            config.redis.port = n;
        }

        if let Some(env) = lookup("FLASK_ENV") {
            config.server.dev_mode = env == "development";
        }

        if let Some(addr) = lookup("DATASVC_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Some(threads) = lookup("DATASVC_WORKER_THREADS")
            && let Ok(n) = threads.parse()
        {
            config.server.worker_threads = n;
        }

        config
    }
}
