use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Strategy;

const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub polling: PollingSettings,
    pub notifications: NotificationSettings,
    pub symbols: SymbolSettings,
    pub backend: BackendSettings,
}

impl Settings {
    /// Layers defaults, an optional TOML file and `DASHBOARD__*` environment
    /// variables, in that order.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }

        let settings: Settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings
            .validate()
            .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.api.base_url.trim().is_empty() {
            errors.push("api.base_url must not be empty".to_string());
        }
        if self.api.request_timeout_ms == 0 {
            errors.push("api.request_timeout_ms must be > 0".to_string());
        }
        if self.polling.idle_interval_ms == 0 || self.polling.active_interval_ms == 0 {
            errors.push("polling intervals must be > 0".to_string());
        }
        if self.polling.active_interval_ms >= self.polling.idle_interval_ms {
            errors.push("polling.active_interval_ms must be < polling.idle_interval_ms".to_string());
        }
        if self.notifications.display_ms == 0 {
            errors.push("notifications.display_ms must be > 0".to_string());
        }
        if self.symbols.baseline.len() != 2 {
            errors.push("symbols.baseline must list exactly two symbols".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub idle_interval_ms: u64,
    pub active_interval_ms: u64,
    /// Re-read the trading status on every tick.
    pub sync_status_on_poll: bool,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            idle_interval_ms: 5_000,
            active_interval_ms: 1_000,
            sync_status_on_poll: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub display_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { display_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSettings {
    pub baseline: Vec<String>,
    pub high_volatility_strategy: Strategy,
    pub separator_label: String,
}

impl Default for SymbolSettings {
    fn default() -> Self {
        Self {
            baseline: vec!["BTC/USDT:USDT".to_string(), "ETH/USDT:USDT".to_string()],
            high_volatility_strategy: Strategy::Rsi,
            separator_label: "──────────────".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub port: u16,
    pub initial_balance: Decimal,
    pub volatile_coins: Vec<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            port: 5_000,
            initial_balance: dec!(10000),
            volatile_coins: vec![
                "DOGE/USDT:USDT".to_string(),
                "SOL/USDT:USDT".to_string(),
                "PEPE/USDT:USDT".to_string(),
                "WIF/USDT:USDT".to_string(),
            ],
        }
    }
}
