//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::batch::PacingPolicy;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Market base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Country code sent with every lookup
    #[serde(default = "default_country")]
    pub country: String,

    /// Steam currency id (12 = PHP)
    #[serde(default = "default_currency")]
    pub currency: u32,

    /// Steam app id (570 = Dota 2)
    #[serde(default = "default_app_id")]
    pub app_id: u32,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per item before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between failed attempts in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Lower bound of the pause after each item in milliseconds
    #[serde(default = "default_item_delay_min_ms")]
    pub item_delay_min_ms: u64,

    /// Upper bound of the pause after each item in milliseconds
    #[serde(default = "default_item_delay_max_ms")]
    pub item_delay_max_ms: u64,

    /// Items between progress checkpoints
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Lower bound of the checkpoint cooldown in seconds
    #[serde(default = "default_cooldown_min_secs")]
    pub cooldown_min_secs: u64,

    /// Upper bound of the checkpoint cooldown in seconds
    #[serde(default = "default_cooldown_max_secs")]
    pub cooldown_max_secs: u64,

    /// Directory report files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output format for the summary
    #[serde(default)]
    pub format: OutputFormat,

    /// Per-item lines included in the summary (0 = none)
    #[serde(default)]
    pub sample_lines: usize,
}

fn default_base_url() -> String {
    "https://steamcommunity.com".to_string()
}

fn default_country() -> String {
    "PH".to_string()
}

fn default_currency() -> u32 {
    12
}

fn default_app_id() -> u32 {
    570
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    3000
}

fn default_item_delay_min_ms() -> u64 {
    3000
}

fn default_item_delay_max_ms() -> u64 {
    6000
}

fn default_checkpoint_every() -> usize {
    20
}

fn default_cooldown_min_secs() -> u64 {
    30
}

fn default_cooldown_max_secs() -> u64 {
    50
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            country: default_country(),
            currency: default_currency(),
            app_id: default_app_id(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            item_delay_min_ms: default_item_delay_min_ms(),
            item_delay_max_ms: default_item_delay_max_ms(),
            checkpoint_every: default_checkpoint_every(),
            cooldown_min_secs: default_cooldown_min_secs(),
            cooldown_max_secs: default_cooldown_max_secs(),
            output_dir: default_output_dir(),
            format: OutputFormat::Text,
            sample_lines: 0,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("dota-price-checker").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("DPC_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(country) = std::env::var("DPC_COUNTRY") {
            if !country.trim().is_empty() {
                self.country = country.trim().to_uppercase();
            }
        }

        if let Ok(currency) = std::env::var("DPC_CURRENCY") {
            if let Ok(c) = currency.parse() {
                self.currency = c;
            }
        }

        if let Ok(app_id) = std::env::var("DPC_APP_ID") {
            if let Ok(a) = app_id.parse() {
                self.app_id = a;
            }
        }

        if let Ok(retries) = std::env::var("DPC_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                self.max_retries = r;
            }
        }

        if let Ok(dir) = std::env::var("DPC_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        self
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between failed attempts.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Pacing policy for the batch runner. Inverted ranges are swapped.
    pub fn pacing(&self) -> PacingPolicy {
        let (delay_lo, delay_hi) = ordered(self.item_delay_min_ms, self.item_delay_max_ms);
        let (cool_lo, cool_hi) = ordered(self.cooldown_min_secs, self.cooldown_max_secs);

        PacingPolicy {
            item_delay_min: Duration::from_millis(delay_lo),
            item_delay_max: Duration::from_millis(delay_hi),
            checkpoint_every: self.checkpoint_every,
            cooldown_min: Duration::from_secs(cool_lo),
            cooldown_max: Duration::from_secs(cool_hi),
        }
    }

    /// Disables every pause (item delay, cooldown, retry backoff).
    pub fn without_delays(mut self) -> Self {
        self.item_delay_min_ms = 0;
        self.item_delay_max_ms = 0;
        self.cooldown_min_secs = 0;
        self.cooldown_max_secs = 0;
        self.retry_backoff_ms = 0;
        self
    }
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Output format for the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
