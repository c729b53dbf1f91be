use crate::core::cache::{DEFAULT_FETCH_TIMEOUT, DEFAULT_STALE_AFTER};
use crate::core::settings::{DEFAULT_ADMIN_SECRET, DEFAULT_BRIDGE_RATE, ExchangeSettings};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BinanceProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_trade_type")]
    pub trade_type: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_trade_type() -> String {
    "BUY".to_string()
}

impl Default for BinanceProviderConfig {
    fn default() -> Self {
        BinanceProviderConfig {
            base_url: "https://p2p.binance.com".to_string(),
            timeout_secs: default_timeout_secs(),
            trade_type: default_trade_type(),
        }
    }
}

/// Static bridge price, used instead of the live source when present.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FixedProviderConfig {
    pub price: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub binance: Option<BinanceProviderConfig>,
    pub fixed: Option<FixedProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            binance: Some(BinanceProviderConfig::default()),
            fixed: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

fn default_stale_after_ms() -> u64 {
    DEFAULT_STALE_AFTER.as_millis() as u64
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            stale_after_ms: default_stale_after_ms(),
        }
    }
}

impl MarketConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

/// Values written to the settings file the first time it is created.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DefaultsConfig {
    #[serde(default = "default_admin_secret")]
    pub admin_secret: String,
    #[serde(default = "default_bridge_rate")]
    pub bridge_rate: f64,
}

fn default_admin_secret() -> String {
    DEFAULT_ADMIN_SECRET.to_string()
}

fn default_bridge_rate() -> f64 {
    DEFAULT_BRIDGE_RATE
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            admin_secret: default_admin_secret(),
            bridge_rate: default_bridge_rate(),
        }
    }
}

impl DefaultsConfig {
    pub fn settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            admin_secret: self.admin_secret.clone(),
            bridge_to_local_rate: Some(self.bridge_rate),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HandoffConfig {
    pub phone: Option<String>,
    #[serde(default = "default_contact_name")]
    pub contact_name: String,
}

fn default_contact_name() -> String {
    "there".to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        HandoffConfig {
            phone: None,
            contact_name: default_contact_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub market: MarketConfig,
    pub settings_path: Option<String>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl AppConfig {
    /// Loads the config at the default location, falling back to built-in
    /// defaults when no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "rupitz", "rupitz")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "rupitz", "rupitz")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.settings_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::default_data_path()?.join("settings.json"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  binance:
    base_url: "http://localhost:9999"
    timeout_secs: 3
market:
  stale_after_ms: 10000
settings_path: "/tmp/rupitz/settings.json"
defaults:
  admin_secret: "s3cret"
  bridge_rate: 2700
handoff:
  phone: "6281235158460"
  contact_name: "Egi"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let binance = config.providers.binance.as_ref().unwrap();
        assert_eq!(binance.base_url, "http://localhost:9999");
        assert_eq!(binance.timeout_secs, 3);
        assert_eq!(binance.trade_type, "BUY");
        assert!(config.providers.fixed.is_none());

        assert_eq!(config.market.stale_after(), Duration::from_secs(10));

        assert_eq!(
            config.settings_path().unwrap(),
            PathBuf::from("/tmp/rupitz/settings.json")
        );
        assert_eq!(config.defaults.settings().admin_secret, "s3cret");
        assert_eq!(config.defaults.settings().bridge_to_local_rate, Some(2700.0));
        assert_eq!(config.handoff.phone.as_deref(), Some("6281235158460"));
        assert_eq!(config.handoff.contact_name, "Egi");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.providers.binance.is_some());
        assert_eq!(config.market.stale_after_ms, 30_000);
        assert_eq!(config.defaults.bridge_rate, 2600.0);
        assert!(config.handoff.phone.is_none());
        assert_eq!(config.handoff.contact_name, "there");
    }

    #[test]
    fn test_fixed_provider_config() {
        let yaml_str = r#"
providers:
  fixed:
    price: 16200
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(config.providers.binance.is_none());
        assert_eq!(config.providers.fixed.unwrap().price, 16_200.0);
    }

    #[test]
    fn test_market_pair_is_not_configurable() {
        let yaml_str = r#"
market:
  fiat: "EUR"
"#;
        let err = serde_yaml::from_str::<AppConfig>(yaml_str).unwrap_err();
        assert!(err.to_string().contains("fiat"), "unexpected error: {err}");
    }
}
