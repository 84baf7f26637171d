//! Configuration module for the echo server.
//!
//! Supports command-line arguments, a TOML configuration file and the
//! `PORT` environment variable. CLI arguments take precedence over the
//! environment, which takes precedence over the config file.

use crate::error::{Error, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Port used when nothing else configures one.
pub const DEFAULT_PORT: u16 = 3000;

/// Command-line arguments for the echo server
#[derive(Parser, Debug, Default)]
#[command(name = "ws-echo")]
#[command(author = "ws-echo authors")]
#[command(version = "0.1.0")]
#[command(about = "A WebSocket echo server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0 or ::1)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (overrides the PORT environment variable)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum number of concurrent connections
    #[arg(short = 'm', long)]
    pub max_connections: Option<usize>,

    /// Number of worker threads (defaults to number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on; the PORT environment variable wins over this
    pub port: Option<u16>,
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Listen backlog passed to listen(2)
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Number of worker threads
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            max_connections: default_max_connections(),
            backlog: default_backlog(),
            workers: None,
        }
    }
}

/// WebSocket limits
#[derive(Debug, Deserialize)]
pub struct WebSocketConfig {
    /// Largest message accepted, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Largest single frame accepted, in bytes
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            max_frame_size: default_max_frame_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_max_connections() -> usize {
    10000
}

fn default_backlog() -> i32 {
    1024
}

fn default_max_message_size() -> usize {
    64 * 1024 * 1024 // 64 MB
}

fn default_max_frame_size() -> usize {
    16 * 1024 * 1024 // 16 MB
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the listen port came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSource {
    Cli,
    Env,
    File,
    Default,
    /// PORT was set but unusable; holds the rejected value.
    InvalidEnv(String),
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub port_source: PortSource,
    pub max_connections: usize,
    pub backlog: i32,
    pub workers: Option<usize>,
    pub max_message_size: usize,
    pub max_frame_size: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::merge(CliArgs::default(), None, TomlConfig::default())
    }
}

impl Config {
    /// Load configuration from CLI args, the environment and an optional
    /// TOML file.
    pub fn load() -> Result<Self> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents =
                std::fs::read_to_string(config_path).map_err(|source| Error::ConfigRead {
                    path: config_path.clone(),
                    source,
                })?;
            toml::from_str(&contents).map_err(|source| Error::ConfigParse {
                path: config_path.clone(),
                source,
            })?
        } else {
            TomlConfig::default()
        };

        let env_port = std::env::var(PORT_ENV).ok();

        Ok(Self::merge(cli, env_port.as_deref(), toml_config))
    }

    /// Merge the three configuration layers (CLI takes precedence).
    pub fn merge(cli: CliArgs, env_port: Option<&str>, toml_config: TomlConfig) -> Self {
        let (port, port_source) = resolve_port(cli.port, env_port, toml_config.server.port);

        Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port,
            port_source,
            max_connections: cli
                .max_connections
                .unwrap_or(toml_config.server.max_connections)
                .max(1),
            backlog: toml_config.server.backlog,
            workers: cli.workers.or(toml_config.server.workers),
            max_message_size: toml_config.websocket.max_message_size,
            max_frame_size: toml_config.websocket.max_frame_size,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        }
    }

    /// The `host:port` string the server binds to.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Pick the listen port.
///
/// An unset or empty `PORT` falls through to the file and then to
/// [`DEFAULT_PORT`]. A value that is not a valid port is reported through
/// [`PortSource::InvalidEnv`] and also falls through; it is never combined
/// with the default numerically.
pub fn resolve_port(
    cli: Option<u16>,
    env: Option<&str>,
    file: Option<u16>,
) -> (u16, PortSource) {
    if let Some(port) = cli {
        return (port, PortSource::Cli);
    }

    let mut rejected = None;
    if let Some(raw) = env.map(str::trim).filter(|raw| !raw.is_empty()) {
        match raw.parse::<u16>() {
            Ok(port) => return (port, PortSource::Env),
            Err(_) => rejected = Some(raw.to_string()),
        }
    }

    let (port, source) = match file {
        Some(port) => (port, PortSource::File),
        None => (DEFAULT_PORT, PortSource::Default),
    };

    match rejected {
        Some(raw) => (port, PortSource::InvalidEnv(raw)),
        None => (port, source),
    }
}
