use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Config file looked up in the working directory when `--config-path` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "agent_dashboard.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[command(about = "Agent availability dashboard", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[arg(
        long,
        env = "DASHBOARD_BASE_URL",
        help = "Base URL serving /api/guardians, /api/platinum and /api/dh-insurance."
    )]
    pub base_url: Option<String>,

    #[arg(
        long,
        env = "DASHBOARD_REFRESH_INTERVAL_SECS",
        help = "Seconds between automatic refresh cycles."
    )]
    pub refresh_interval_secs: Option<u64>,

    #[arg(
        long,
        env = "DASHBOARD_AUTO_REFRESH",
        help = "Start with auto-refresh enabled (true/false)."
    )]
    pub auto_refresh: Option<bool>,

    #[arg(
        long,
        env = "DASHBOARD_REQUEST_TIMEOUT_SECS",
        help = "Per-request timeout in seconds, 0 disables it."
    )]
    pub request_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "DASHBOARD_MAX_RETRIES",
        help = "Transient-failure retries per request, 0 for a single attempt."
    )]
    pub max_retries: Option<u32>,

    #[arg(long, env = "DASHBOARD_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[arg(long, env = "DASHBOARD_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "DASHBOARD_LOG_LEVEL",
        help = "Logging level (trace, debug, info, warn, error)."
    )]
    pub log_level: Option<String>,

    #[arg(long, help = "Run a single refresh cycle, print the result and exit.")]
    #[serde(skip)]
    pub once: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Base URL {0} must use http or https")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

impl Config {
    pub fn defaults() -> Config {
        Config {
            base_url: Some("http://127.0.0.1:3000/".to_string()),
            refresh_interval_secs: Some(10),
            auto_refresh: Some(true),
            request_timeout_secs: Some(10),
            max_retries: Some(0),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            base_url: other.base_url.or(self.base_url),
            refresh_interval_secs: other.refresh_interval_secs.or(self.refresh_interval_secs),
            auto_refresh: other.auto_refresh.or(self.auto_refresh),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            once: self.once || other.once,
        }
    }
}

/// Fully resolved, validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub refresh_interval: Duration,
    pub auto_refresh: bool,
    pub request_timeout: Option<Duration>,
    pub max_retries: u32,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub once: bool,
    /// Problems found while reading the config file; logged once logging is up.
    pub warnings: Vec<String>,
}

/// Defaults, then the config file, then environment variables and CLI flags.
pub fn load_config() -> Result<Settings, ConfigError> {
    resolve(Config::parse())
}

/// Layers `cli` (which already includes environment variables) over the
/// config file and the built-in defaults, then validates the result.
pub fn resolve(cli: Config) -> Result<Settings, ConfigError> {
    let mut warnings = Vec::new();
    let mut current_config = Config::defaults();

    let explicit_path = cli.config_path.is_some();
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match read_config_file(&config_file_path) {
        Ok(Some(file_config)) => current_config = current_config.merge(file_config),
        Ok(None) if explicit_path => warnings.push(format!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        )),
        Ok(None) => {}
        Err(warning) => warnings.push(warning),
    }

    current_config = current_config.merge(cli);
    validate(current_config, warnings)
}

fn read_config_file(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let config_str = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read config file {}: {}. Falling back to other sources.",
            path.display(),
            e
        )
    })?;
    serde_json::from_str::<Config>(&config_str)
        .map(Some)
        .map_err(|e| {
            format!(
                "Failed to parse config file {}: {}. Falling back to other sources.",
                path.display(),
                e
            )
        })
}

fn validate(config: Config, warnings: Vec<String>) -> Result<Settings, ConfigError> {
    let defaults = Config::defaults();
    let raw_url = config.base_url.or(defaults.base_url).unwrap_or_default();
    let base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw_url.clone(),
        source,
    })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(raw_url));
    }

    let refresh_interval_secs = config.refresh_interval_secs.unwrap_or(10);
    if refresh_interval_secs == 0 {
        return Err(ConfigError::ZeroValue("refreshIntervalSecs"));
    }

    let request_timeout = match config.request_timeout_secs.unwrap_or(10) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(Settings {
        base_url,
        refresh_interval: Duration::from_secs(refresh_interval_secs),
        auto_refresh: config.auto_refresh.unwrap_or(true),
        request_timeout,
        max_retries: config.max_retries.unwrap_or(0),
        log_dir: config.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
        log_level: config.log_level.unwrap_or_else(|| "info".to_string()),
        once: config.once,
        warnings,
    })
}
