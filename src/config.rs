//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\rapgraff\config.toml
//! - macOS: ~/Library/Application Support/rapgraff/config.toml
//! - Linux: ~/.config/rapgraff/config.toml
//!
//! An explicit path can be given with `--config`. Every section is
//! optional; missing values fall back to the defaults below.
//!
//! Crawl limits are chosen per environment (`development`, `production`,
//! `test`) from the `[profiles.<env>]` tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding the Last.fm API key
pub const LASTFM_KEY_VAR: &str = "LASTFM_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API and store credentials
    pub credentials: Credentials,

    /// Document store location
    pub store: StoreConfig,

    pub lastfm: LastFmConfig,

    pub musicbrainz: MusicBrainzConfig,

    /// Crawl behaviour
    pub crawl: CrawlConfig,

    /// Retry policy for failed upstream requests
    pub retry: RetryConfig,

    /// Passthrough proxy
    pub proxy: ProxyConfig,

    /// Crawl limits per environment
    pub profiles: BTreeMap<String, Limits>,
}

impl Default for Config {
    fn default() -> Self {
        let profiles = Environment::ALL
            .iter()
            .map(|env| (env.to_string(), env.default_limits()))
            .collect();

        Self {
            credentials: Credentials::default(),
            store: StoreConfig::default(),
            lastfm: LastFmConfig::default(),
            musicbrainz: MusicBrainzConfig::default(),
            crawl: CrawlConfig::default(),
            retry: RetryConfig::default(),
            proxy: ProxyConfig::default(),
            profiles,
        }
    }
}

impl Config {
    /// Crawl limits for an environment, falling back to its built-in defaults.
    pub fn limits(&self, env: Environment) -> Limits {
        self.profiles
            .get(env.as_str())
            .copied()
            .unwrap_or_else(|| env.default_limits())
    }

    /// Apply environment-variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = std::env::var(LASTFM_KEY_VAR).ok().filter(|k| !k.is_empty()) {
            self.credentials.lastfm_api_key = Some(key);
        }
    }
}

/// API credentials (keep separate for potential future encryption)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Last.fm API key
    pub lastfm_api_key: Option<String>,

    /// Basic auth user for the document store
    pub store_username: Option<String>,

    /// Basic auth password for the document store
    pub store_password: Option<String>,

    /// User-Agent sent upstream (MusicBrainz requires a meaningful one)
    pub user_agent: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            lastfm_api_key: None,
            store_username: None,
            store_password: None,
            user_agent: format!(
                "rapgraff/{} ( https://github.com/rapgraff/rapgraff )",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

/// Document store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the CouchDB-compatible server
    pub url: String,

    /// Database holding the artist and track documents
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5984".to_string(),
            database: "rapgraff".to_string(),
        }
    }
}

/// Last.fm client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    pub base_url: String,

    /// Pause after each request, in milliseconds
    pub delay_ms: u64,

    /// Tracks requested per `artist.getTopTracks` page
    pub page_size: u32,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ws.audioscrobbler.com/2.0/".to_string(),
            delay_ms: 200,
            page_size: 50,
        }
    }
}

/// Response format requested from MusicBrainz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Value of the `fmt` query parameter
    pub fn as_param(self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }
}

/// MusicBrainz client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzConfig {
    pub base_url: String,

    /// Pause after each request, in milliseconds (the service allows 1 req/sec)
    pub delay_ms: u64,

    /// Recordings requested per search page
    pub page_size: u32,

    pub format: ResponseFormat,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            delay_ms: 1000,
            page_size: 100,
            format: ResponseFormat::Json,
        }
    }
}

/// Crawl behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Chart tag the crawl starts from
    pub tag: String,

    /// Consecutive empty-queue polls tolerated before the run is declared stalled
    pub stall_polls: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            tag: "hip-hop".to_string(),
            stall_polls: 10,
        }
    }
}

/// Retry policy for upstream requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per work item, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

/// Passthrough proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:4187".to_string(),
        }
    }
}

/// How much of the chart to harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Number of top artists to discover
    pub artists: u32,

    /// Number of top tracks to discover per artist
    pub tracks: u32,
}

/// Deployment environment, selecting a [`Limits`] profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Production,
        Environment::Test,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn default_limits(self) -> Limits {
        match self {
            Environment::Development | Environment::Production => Limits {
                artists: 500,
                tracks: 100,
            },
            Environment::Test => Limits {
                artists: 5,
                tracks: 5,
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rapgraff"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns the default config if the directory is unknown or the file
/// doesn't exist; a file that exists but can't be read or parsed is an error.
pub fn load() -> Result<Config, ConfigError> {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Ok(Config::default());
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Unknown environment {0:?} (expected development, production or test)")]
    UnknownEnvironment(String),
}

// ============================================================================
// Tests
// ============================================================================
