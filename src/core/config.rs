//! Configuration - Type-safe, validated config

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::{Error, Result, Symbol};
use crate::grid::GridParams;

/// Environment variable holding the venue API key
pub const API_KEY_ENV: &str = "HFT_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,

    /// Venue connection
    pub venue: VenueConfig,

    /// Ladder built on reset
    pub grid: GridParams,

    /// Engine timings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Paper-mode simulation
    #[serde(default)]
    pub paper: PaperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run mode: paper or live
    pub mode: RunMode,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Paper,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// REST endpoint root
    pub base_url: String,

    /// API key (loaded from env if not provided)
    pub api_key: Option<String>,

    /// Traded symbol, one grid per symbol
    pub symbol: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Trade history polling period for the live fill feed
    #[serde(default = "default_trade_poll_ms")]
    pub trade_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period between pulse sweeps
    pub pulse_interval_ms: u64,

    /// Delay between cancel attempts
    pub cancel_retry_ms: u64,

    /// Reconcile iteration cap, per level in the grid
    pub reconcile_iterations_per_level: usize,

    /// Jitter seed; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pulse_interval_ms: 5_000,
            cancel_retry_ms: 5_000,
            reconcile_iterations_per_level: 4,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn pulse_interval(&self) -> Duration {
        Duration::from_millis(self.pulse_interval_ms)
    }

    pub fn cancel_retry(&self) -> Duration {
        Duration::from_millis(self.cancel_retry_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Period between simulated price moves
    pub walk_interval_ms: u64,

    /// Largest move per step, in grid deltas
    pub walk_max_ticks: u32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            walk_interval_ms: 1_000,
            walk_max_ticks: 2,
        }
    }
}

fn default_log_level() -> String {
    "info,pulse_grid=debug".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_trade_poll_ms() -> u64 {
    1_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                mode: RunMode::Paper,
                log_level: default_log_level(),
            },
            venue: VenueConfig {
                base_url: "https://hft-apiv2.lykke.com".to_string(),
                api_key: None,
                symbol: "ETHUSD".to_string(),
                request_timeout_ms: default_request_timeout_ms(),
                trade_poll_ms: default_trade_poll_ms(),
            },
            grid: GridParams {
                init_price: Decimal::from(350),
                level_min_size: Decimal::new(1, 3),
                delta: Decimal::ONE,
                levels_per_side: 50,
                price_pulse_tick: Decimal::new(1, 1),
                price_pulse_max_ticks: 4,
                size_pulse_tick: Decimal::ZERO,
                size_pulse_max_ticks: 0,
            },
            engine: EngineConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;

        if self.venue.symbol.trim().is_empty() {
            return Err(Error::Config("venue.symbol is empty".to_string()));
        }
        if self.engine.pulse_interval_ms == 0 || self.engine.cancel_retry_ms == 0 {
            return Err(Error::Config("engine intervals must be positive".to_string()));
        }
        if self.engine.reconcile_iterations_per_level == 0 {
            return Err(Error::Config(
                "engine.reconcile_iterations_per_level must be positive".to_string(),
            ));
        }
        if self.app.mode == RunMode::Live && self.venue.base_url.trim().is_empty() {
            return Err(Error::Config("live mode requires venue.base_url".to_string()));
        }
        if self.app.mode == RunMode::Paper && self.paper.walk_interval_ms == 0 {
            return Err(Error::Config("paper.walk_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::new(&self.venue.symbol)
    }

    /// API key from the file, else from the environment
    pub fn api_key(&self) -> Option<String> {
        self.venue
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}
