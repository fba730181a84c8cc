//! # Register Configuration
//!
//! Settings for one register host, loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_REGISTER_ID=front-1                                          │
//! │     TALLY_STAFF_ID=staff-7                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/register.toml (Linux)                          │
//! │     ~/Library/Application Support/com.tally.pos/register.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! register_id = "front-1"
//! store_name = "Corner Shop"
//! currency_symbol = "$"
//! staff_id = "staff-7"        # omit to start signed out
//! seed_demo_catalog = true
//! ```
//!
//! Read-only after startup, so no lock around it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::Money;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Register host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Register this host serves by default.
    pub register_id: String,

    /// Store name (shown on receipts).
    pub store_name: String,

    /// Currency symbol for display.
    pub currency_symbol: String,

    /// Staff member signed in at startup. `None` starts signed out.
    pub staff_id: Option<String>,

    /// Fill the in-memory catalog with demo products.
    pub seed_demo_catalog: bool,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            register_id: "register-1".to_string(),
            store_name: "Tally POS Dev Store".to_string(),
            currency_symbol: "$".to_string(),
            staff_id: None,
            seed_demo_catalog: true,
        }
    }
}

impl RegisterConfig {
    /// Loads configuration.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`register.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.register_id.trim().is_empty() {
            return Err(ConfigError::Invalid("register_id must not be empty".into()));
        }

        if self.currency_symbol.is_empty() {
            return Err(ConfigError::Invalid("currency_symbol must not be empty".into()));
        }

        if matches!(&self.staff_id, Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "staff_id must not be blank; omit it to start signed out".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("TALLY_REGISTER_ID") {
            debug!(register_id = %id, "Overriding register id from environment");
            self.register_id = id;
        }

        if let Some(name) = lookup("TALLY_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }

        if let Some(staff) = lookup("TALLY_STAFF_ID") {
            debug!(staff_id = %staff, "Overriding staff id from environment");
            self.staff_id = Some(staff);
        }

        if let Some(seed) = lookup("TALLY_SEED_DEMO_CATALOG") {
            match seed.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.seed_demo_catalog = true,
                "0" | "false" | "no" => self.seed_demo_catalog = false,
                _ => warn!(value = %seed, "Unknown TALLY_SEED_DEMO_CATALOG value"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    /// Formats an amount with the configured currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::Money;
    /// use tally_register::config::RegisterConfig;
    ///
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_money(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            amount.dollars().abs(),
            amount.cents_part().abs()
        )
    }
}
