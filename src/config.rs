//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Load the CSV into memory at startup
    Memory,
    /// Read from a SQLite database, importing the CSV when it is empty
    Sqlite,
}

impl Backend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(Backend::Memory),
            "sqlite" | "db" => Some(Backend::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite => "sqlite",
        }
    }
}

/// Dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_import_if_empty")]
    pub import_if_empty: bool,
}

fn default_backend() -> Backend {
    Backend::Memory
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("./data/poi_data.csv")
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("footfall").join("footfall.db"))
        .unwrap_or_else(|| PathBuf::from("./footfall_data/footfall.db"))
}

fn default_import_if_empty() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            csv_path: default_csv_path(),
            db_path: default_db_path(),
            import_if_empty: default_import_if_empty(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CSV export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    crate::export::DEFAULT_CHUNK_SIZE
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> String {
        format!("footfall={},tower_http=debug", self.level)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.default_directive()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `$FOOTFALL_CONFIG`, then the default locations, then the
    /// environment alone
    pub fn load_default() -> Self {
        let config_paths = [
            std::env::var_os("FOOTFALL_CONFIG").map(PathBuf::from),
            dirs::config_dir().map(|p| p.join("footfall").join("config.toml")),
            Some(PathBuf::from("/etc/footfall/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Data overrides
        if let Some(csv_path) = var("FOOTFALL_CSV_PATH") {
            self.data.csv_path = PathBuf::from(csv_path);
        }
        if let Some(backend) = var("FOOTFALL_BACKEND") {
            match Backend::parse(&backend) {
                Some(b) => self.data.backend = b,
                None => tracing::warn!("Ignoring unknown FOOTFALL_BACKEND {:?}", backend),
            }
        }
        if let Some(db_path) = var("FOOTFALL_DB_PATH") {
            self.data.db_path = PathBuf::from(db_path);
        }

        // API overrides
        if let Some(host) = var("FOOTFALL_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("FOOTFALL_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("FOOTFALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FOOTFALL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Footfall Configuration
#
# Environment variables override these settings:
# - FOOTFALL_CONFIG (path to this file)
# - FOOTFALL_CSV_PATH
# - FOOTFALL_BACKEND
# - FOOTFALL_DB_PATH
# - FOOTFALL_API_HOST
# - FOOTFALL_API_PORT
# - FOOTFALL_LOG_LEVEL
# - FOOTFALL_LOG_FORMAT

[data]
# Where records are served from: "memory" or "sqlite"
backend = "memory"

# Source CSV with one POI per row
csv_path = "./data/poi_data.csv"

# SQLite database used by the sqlite backend
db_path = "~/.local/share/footfall/footfall.db"

# Import the CSV into SQLite on startup when the table is empty
import_if_empty = true

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8000

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[export]
# Rows encoded per streamed CSV chunk
chunk_size = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
