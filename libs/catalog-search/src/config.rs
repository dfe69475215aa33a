//! Configuration
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `catalog-search.toml` (or `.yaml`/`.json`) in the working directory, if present
//! 3. environment variables `CATALOG_SEARCH__<SECTION>__<KEY>`, e.g.
//!    `CATALOG_SEARCH__COUCHDB__URL`; a `.env` file is loaded first

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const CONFIG_FILE: &str = "catalog-search";
const ENV_PREFIX: &str = "CATALOG_SEARCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub couchdb: CouchDbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDbConfig {
    pub url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for CouchDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".to_string(),
            database: "sw360db".to_string(),
            username: None,
            password: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Upper bound on hits per Nouveau request
    pub nouveau_max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 1000,
            nouveau_max_limit: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "catalog-search".to_string(),
            file_rotation: "daily".to_string(),
        }
    }
}

impl Config {
    /// Load from defaults, the optional config file and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config: Config = Self::builder_with_defaults()?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder().add_source(config::Config::try_from(&Config::default())?))
    }

    pub fn validate(&self) -> Result<()> {
        if self.couchdb.url.trim().is_empty() {
            return Err(Error::Validation("couchdb.url must not be empty".to_string()));
        }
        if self.couchdb.database.trim().is_empty() {
            return Err(Error::Validation(
                "couchdb.database must not be empty".to_string(),
            ));
        }
        if self.search.default_page_size == 0 || self.search.max_page_size == 0 {
            return Err(Error::Validation(
                "search page sizes must be greater than 0".to_string(),
            ));
        }
        if self.search.default_page_size > self.search.max_page_size {
            return Err(Error::Validation(
                "search.default_page_size exceeds search.max_page_size".to_string(),
            ));
        }
        if self.search.nouveau_max_limit == 0 {
            return Err(Error::Validation(
                "search.nouveau_max_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
