use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, error};

use crate::transport::DEFAULT_CHANNEL_NAME;
use crate::utils::ids;

/// What this process does on startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Serve the websocket relay and HTTP API
    Relay,
    /// Host a mesh session through a relay
    Host,
    /// Join a mesh session through a relay
    Join,
    /// Single-user journal on local storage
    Solo,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Comma separated origins allowed to call the relay API; any origin if unset
    pub cors_origins: Option<String>,

    #[serde(default = "default_mode")]
    pub mode: RunMode,

    /// Name of the broadcast channel peers meet on
    #[serde(default = "default_mesh_channel")]
    pub mesh_channel: String,

    /// Relay base url used by host/join mode
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Display name; a random `Dev-N` if unset
    pub peer_name: Option<String>,

    /// Directory for locally persisted sessions and scratchpad
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Warn when a joiner has no snapshot after this many seconds
    pub welcome_timeout_secs: Option<u64>,

    /// Frames buffered per relay channel before slow receivers start losing them
    #[serde(default = "default_relay_channel_capacity")]
    pub relay_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn peer_name(&self) -> String {
        self.peer_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(ids::generate_peer_name)
    }

    pub fn welcome_timeout(&self) -> Option<Duration> {
        self.welcome_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            mode: default_mode(),
            mesh_channel: default_mesh_channel(),
            relay_url: default_relay_url(),
            peer_name: None,
            data_dir: default_data_dir(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            welcome_timeout_secs: None,
            relay_channel_capacity: default_relay_channel_capacity(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_mode() -> RunMode {
    RunMode::Relay
}

fn default_mesh_channel() -> String {
    DEFAULT_CHANNEL_NAME.to_string()
}

fn default_relay_url() -> String {
    "ws://127.0.0.1:3000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".devcognition")
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_relay_channel_capacity() -> usize {
    256
}
