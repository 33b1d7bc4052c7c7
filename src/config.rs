use serde::Deserialize;
use std::path::Path;

/// Config file read when `CONFIG_FILE` is not set; running without it uses defaults.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub docker: DockerConfig,
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker endpoint (`unix://...`, `tcp://...`).
    /// Falls back to `DOCKER_HOST`, then the local socket.
    pub host: Option<String>,
    /// Grace period given to stop/restart before the runtime kills the container.
    pub stop_timeout_secs: u32,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: None,
            stop_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Items buffered between a runtime feed and its consumer; a full queue pauses the feed read.
    pub feed_capacity: usize,
    pub ws_send_timeout_secs: u64,
    pub ws_ping_interval_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            feed_capacity: 8,
            ws_send_timeout_secs: 10,
            ws_ping_interval_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(&path),
            Err(_) if !Path::new(DEFAULT_CONFIG_PATH).exists() => {
                tracing::info!("{} not found, using default config", DEFAULT_CONFIG_PATH);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(_) => Self::load_from_path(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        if let Some(host) = &self.docker.host {
            anyhow::ensure!(!host.is_empty(), "docker.host must be non-empty when set");
        }
        anyhow::ensure!(
            self.docker.stop_timeout_secs > 0,
            "docker.stop_timeout_secs must be > 0, got {}",
            self.docker.stop_timeout_secs
        );
        anyhow::ensure!(
            self.streaming.feed_capacity > 0,
            "streaming.feed_capacity must be > 0, got {}",
            self.streaming.feed_capacity
        );
        anyhow::ensure!(
            self.streaming.ws_send_timeout_secs > 0,
            "streaming.ws_send_timeout_secs must be > 0, got {}",
            self.streaming.ws_send_timeout_secs
        );
        anyhow::ensure!(
            self.streaming.ws_ping_interval_secs > 0,
            "streaming.ws_ping_interval_secs must be > 0, got {}",
            self.streaming.ws_ping_interval_secs
        );
        Ok(())
    }
}
