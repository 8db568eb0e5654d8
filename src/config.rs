//! Client configuration.
//!
//! Loaded once at startup from `settings.json` (when present) with `ECDL_*`
//! environment variable overrides, then validated. Malformed configuration is
//! a fatal startup error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::info;

use crate::engine::Backend;

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Coordination server settings
    pub server: ServerConfig,
    /// Compute backend settings
    pub compute: ComputeConfig,
    /// Result cache and delivery settings
    pub cache: CacheConfig,
    /// Loop cadences and network timeouts
    pub timing: TimingConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Coordination server host
    pub host: String,
    /// Coordination server port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// Search backend selected at startup
    pub backend: Backend,
    /// Worker thread count for the CPU backend
    pub threads: usize,
    /// Independent walks advanced by each worker
    pub points_per_thread: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Pending-cache size that triggers a submission
    pub point_cache_size: usize,
    /// Bound on the engine-to-verifier candidate queue. Engine workers block
    /// once this many candidates are waiting to be verified.
    pub result_queue_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Nominal delay between server status polls
    pub status_poll_secs: u64,
    /// Backoff after a failed status poll
    pub poll_retry_secs: u64,
    /// Submission pump cycle period
    pub pump_interval_secs: u64,
    /// Per-request network timeout
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9447,
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cpu,
            threads: 4,
            points_per_thread: 32,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            point_cache_size: 64,
            result_queue_size: 256,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            status_poll_secs: 300,
            poll_retry_secs: 60,
            pump_interval_secs: 30,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            compute: ComputeConfig::default(),
            cache: CacheConfig::default(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `settings.json` (if present) and environment
    /// variable overrides, then validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: ClientConfig = serde_json::from_str(&raw)
                .with_context(|| format!("Malformed configuration in {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            ClientConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var("ECDL_SERVER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = env::var("ECDL_SERVER_PORT") {
            self.server.port = port.parse().context("Invalid ECDL_SERVER_PORT value")?;
        }

        if let Ok(backend) = env::var("ECDL_BACKEND") {
            self.compute.backend = backend.parse().context("Invalid ECDL_BACKEND value")?;
        }

        if let Ok(threads) = env::var("ECDL_THREADS") {
            self.compute.threads = threads.parse().context("Invalid ECDL_THREADS value")?;
        }

        if let Ok(ppt) = env::var("ECDL_POINTS_PER_THREAD") {
            self.compute.points_per_thread =
                ppt.parse().context("Invalid ECDL_POINTS_PER_THREAD value")?;
        }

        if let Ok(size) = env::var("ECDL_POINT_CACHE_SIZE") {
            self.cache.point_cache_size =
                size.parse().context("Invalid ECDL_POINT_CACHE_SIZE value")?;
        }

        if let Ok(size) = env::var("ECDL_RESULT_QUEUE_SIZE") {
            self.cache.result_queue_size = size
                .parse()
                .context("Invalid ECDL_RESULT_QUEUE_SIZE value")?;
        }

        if let Ok(level) = env::var("ECDL_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration for consistency before entering the main loop.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if self.compute.threads == 0 {
            anyhow::bail!("Thread count must be at least 1");
        }

        if self.compute.points_per_thread == 0 {
            anyhow::bail!("points_per_thread must be at least 1");
        }

        if self.cache.point_cache_size == 0 {
            anyhow::bail!("point_cache_size must be at least 1");
        }

        if self.cache.result_queue_size == 0 {
            anyhow::bail!("result_queue_size must be at least 1");
        }

        if self.timing.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be non-zero");
        }

        Ok(())
    }

    /// Base URL of the coordination server.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }
}
