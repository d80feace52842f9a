use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the generator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DexgenConfig {
    /// Upstream REST API
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry and pacing for every outbound request
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Basics generation worker pool
    #[serde(default)]
    pub basics: BasicsConfig,

    /// Language preferences for localized text
    #[serde(default)]
    pub localization: LocalizationConfig,

    /// Input and output documents
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn species_url(&self, id: EntityId) -> String {
        format!("{}/pokemon-species/{}", self.base(), id)
    }

    pub fn species_list_url(&self, limit: u32, offset: u32) -> String {
        format!(
            "{}/pokemon-species?limit={}&offset={}",
            self.base(),
            limit,
            offset
        )
    }

    pub fn pokemon_url(&self, id: EntityId) -> String {
        format!("{}/pokemon/{}", self.base(), id)
    }

    pub fn ability_url(&self, name: &str) -> String {
        format!("{}/ability/{}", self.base(), name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Retries after the first attempt; total attempts = max_retries + 1
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay before a retry, multiplied by the attempt number
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause after every successful request
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicsConfig {
    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Log progress every N entries
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for BasicsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress_every: default_progress_every(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Languages consulted in order before the fallback
    #[serde(default = "default_preferred_languages")]
    pub preferred: Vec<String>,

    #[serde(default = "default_fallback_language")]
    pub fallback: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            preferred: default_preferred_languages(),
            fallback: default_fallback_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Written by `basics`
    #[serde(default = "default_basics_output")]
    pub basics_output: PathBuf,

    /// Read by `details` and `add-evolution`
    #[serde(default = "default_basics_input")]
    pub basics_input: PathBuf,

    /// Written by `details`
    #[serde(default = "default_details_output")]
    pub details_output: PathBuf,

    /// Rewritten in place by `add-evolution`
    #[serde(default = "default_details_merge_target")]
    pub details_merge_target: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            basics_output: default_basics_output(),
            basics_input: default_basics_input(),
            details_output: default_details_output(),
            details_merge_target: default_details_merge_target(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
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

/// Upper bound accepted for `fetch.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 100;

// Default value functions
fn default_api_base() -> String {
    "https://pokeapi.co/api/v2".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("dexgen/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_retries() -> u32 {
    4
}
fn default_retry_delay_ms() -> u64 {
    400
}
fn default_request_delay_ms() -> u64 {
    80
}
fn default_concurrency() -> usize {
    6
}
fn default_progress_every() -> usize {
    50
}
fn default_preferred_languages() -> Vec<String> {
    vec!["ko".to_string()]
}
fn default_fallback_language() -> String {
    "en".to_string()
}
fn default_basics_output() -> PathBuf {
    PathBuf::from("src/data/basicsAll.json")
}
fn default_basics_input() -> PathBuf {
    PathBuf::from("src/data/Allbasics.json")
}
fn default_details_output() -> PathBuf {
    PathBuf::from("src/data/detailsAll.json")
}
fn default_details_merge_target() -> PathBuf {
    PathBuf::from("src/data/Alldetails.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration manager
pub struct ConfigManager {
    config: DexgenConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (explicit path, ./.dexgen.toml, ~/.dexgen/config.toml)
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file(explicit_path)?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none (using defaults)"),
        }
        info!("API base: {}", config.api.base_url);
        info!(
            "Fetch: {} retries, {}ms retry delay, {}ms pacing",
            config.fetch.max_retries, config.fetch.retry_delay_ms, config.fetch.request_delay_ms
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Build a manager around an already constructed configuration
    pub fn from_config(config: DexgenConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
        }
    }

    fn load_config_file(
        explicit_path: Option<&Path>,
    ) -> Result<(DexgenConfig, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            let config = Self::read_toml_file(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let local_config = Path::new(".dexgen.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".dexgen").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((DexgenConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<DexgenConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: DexgenConfig) -> DexgenConfig {
        if let Ok(base) = std::env::var("DEXGEN_API_BASE") {
            config.api.base_url = base;
        }
        if let Ok(retries) = std::env::var("DEXGEN_MAX_RETRIES") {
            if let Ok(n) = retries.parse() {
                config.fetch.max_retries = n;
            }
        }
        if let Ok(delay) = std::env::var("DEXGEN_RETRY_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.fetch.retry_delay_ms = ms;
            }
        }
        if let Ok(delay) = std::env::var("DEXGEN_REQUEST_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.fetch.request_delay_ms = ms;
            }
        }
        if let Ok(concurrency) = std::env::var("DEXGEN_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                config.basics.concurrency = n;
            }
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    fn validate_config(config: &DexgenConfig) -> Result<(), ConfigError> {
        match url::Url::parse(&config.api.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::ValidationError(format!(
                    "API base URL must be http(s), got scheme: {}",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid API base URL {:?}: {}",
                    config.api.base_url, e
                )))
            }
        }

        if config.fetch.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "fetch.max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, config.fetch.max_retries
            )));
        }

        if config.basics.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "basics.concurrency must be at least 1".to_string(),
            ));
        }

        if config.localization.fallback.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "localization.fallback must name a language".to_string(),
            ));
        }

        // RUST_LOG may carry a full filter directive; only bare levels are checked.
        let level = config.logging.level.as_str();
        if !level.contains('=') && !level.contains(',') {
            match level {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        other
                    )))
                }
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DexgenConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn into_config(self) -> DexgenConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DexgenConfig::default();
        assert_eq!(config.api.base_url, "https://pokeapi.co/api/v2");
        assert_eq!(config.fetch.max_retries, 4);
        assert_eq!(config.fetch.retry_delay_ms, 400);
        assert_eq!(config.fetch.request_delay_ms, 80);
        assert_eq!(config.basics.concurrency, 6);
        assert_eq!(config.localization.preferred, vec!["ko".to_string()]);
        assert_eq!(config.localization.fallback, "en");
    }

    #[test]
    fn test_config_validation() {
        let config = DexgenConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_config = config.clone();
        bad_config.basics.concurrency = 0;
        assert!(ConfigManager::validate_config(&bad_config).is_err());

        let mut bad_config = config.clone();
        bad_config.api.base_url = "ftp://example.org".to_string();
        assert!(ConfigManager::validate_config(&bad_config).is_err());

        let mut bad_config = config.clone();
        bad_config.logging.level = "loud".to_string();
        assert!(ConfigManager::validate_config(&bad_config).is_err());

        let mut bad_config = config.clone();
        bad_config.fetch.max_retries = u32::MAX;
        assert!(ConfigManager::validate_config(&bad_config).is_err());

        let mut bad_config = config.clone();
        bad_config.fetch.max_retries = MAX_RETRIES_LIMIT;
        assert!(ConfigManager::validate_config(&bad_config).is_ok());

        let mut directive = config;
        directive.logging.level = "dexgen_pipeline=debug,info".to_string();
        assert!(ConfigManager::validate_config(&directive).is_ok());
    }

    #[test]
    fn test_api_urls_ignore_trailing_slash() {
        let api = ApiConfig {
            base_url: "https://pokeapi.co/api/v2/".to_string(),
            ..Default::default()
        };
        assert_eq!(api.species_url(1), "https://pokeapi.co/api/v2/pokemon-species/1");
        assert_eq!(api.pokemon_url(25), "https://pokeapi.co/api/v2/pokemon/25");
        assert_eq!(
            api.ability_url("overgrow"),
            "https://pokeapi.co/api/v2/ability/overgrow"
        );
        assert_eq!(
            api.species_list_url(1, 0),
            "https://pokeapi.co/api/v2/pokemon-species?limit=1&offset=0"
        );
    }
}
