//! Configuration management for the Zaiko inventory engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with ZAIKO_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Feed file locations
    pub feeds: FeedConfig,

    /// Export artifact configuration
    pub exports: ExportConfig,

    /// Order intake configuration
    pub orders: OrderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Directory holding the bundled feed files
    pub data_dir: PathBuf,

    /// Ranked candidate paths for the inventory feed; the first existing wins
    #[serde(default)]
    pub inventory_candidates: Vec<PathBuf>,

    /// Ranked candidate paths for the name roster feed
    #[serde(default)]
    pub roster_candidates: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Output directory for CSV artifacts; defaults to `<data_dir>/exports`
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrderConfig {
    /// Item-name prefix that marks rice items
    pub rice_prefix: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ZAIKO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.url", "postgres://localhost/zaiko")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("feeds.data_dir", "data")?
            .set_default("orders.rice_prefix", "ご飯")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ZAIKO_ prefix)
            .add_source(
                Environment::with_prefix("ZAIKO")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("feeds.inventory_candidates")
                    .with_list_parse_key("feeds.roster_candidates")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config.with_default_candidates())
    }

    /// Fill empty candidate lists with the bundled files under `data_dir`
    pub fn with_default_candidates(mut self) -> Self {
        if self.feeds.inventory_candidates.is_empty() {
            self.feeds.inventory_candidates = vec![self.feeds.data_dir.join("zaikokanri.csv")];
        }
        if self.feeds.roster_candidates.is_empty() {
            self.feeds.roster_candidates = vec![self.feeds.data_dir.join("meibo.csv")];
        }
        self
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.exports
            .dir
            .clone()
            .unwrap_or_else(|| self.feeds.data_dir.join("exports"))
    }

    /// Config rooted at `data_dir`, used by tests and tooling
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            environment: "test".to_string(),
            database: DatabaseConfig::default(),
            feeds: FeedConfig {
                data_dir: data_dir.into(),
                inventory_candidates: Vec::new(),
                roster_candidates: Vec::new(),
            },
            exports: ExportConfig { dir: None },
            orders: OrderConfig {
                rice_prefix: "ご飯".to_string(),
            },
        }
        .with_default_candidates()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/zaiko".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}
