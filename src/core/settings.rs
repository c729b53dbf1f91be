//! Administrator-controlled exchange settings.

use super::error::ExchangeError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder shown wherever the administrator secret would appear.
pub const MASKED_SECRET: &str = "********";

pub const DEFAULT_ADMIN_SECRET: &str = "traubz6000";
pub const DEFAULT_BRIDGE_RATE: f64 = 2600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSettings {
    #[serde(rename = "admin_password")]
    pub admin_secret: String,
    /// Price of one bridge unit (USDT) in local fiat (TZS).
    #[serde(rename = "usdt_tzs", default)]
    pub bridge_to_local_rate: Option<f64>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            admin_secret: DEFAULT_ADMIN_SECRET.to_string(),
            bridge_to_local_rate: Some(DEFAULT_BRIDGE_RATE),
        }
    }
}

impl ExchangeSettings {
    /// The configured rate, if it is usable for a conversion.
    pub fn validated_rate(&self) -> Result<f64, ExchangeError> {
        match self.bridge_to_local_rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
            _ => Err(ExchangeError::SettingsInvalid),
        }
    }

    pub fn secret_matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate == self.admin_secret
    }
}

/// Settings as shown to any caller. The real secret is never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsView {
    #[serde(rename = "usdt_tzs")]
    pub bridge_to_local_rate: Option<f64>,
    #[serde(rename = "admin_password")]
    pub admin_secret: String,
    #[serde(rename = "updatedAt")]
    pub price_updated_at: Option<DateTime<Utc>>,
}

impl SettingsView {
    pub fn new(settings: &ExchangeSettings, price_updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            bridge_to_local_rate: settings.bridge_to_local_rate,
            admin_secret: MASKED_SECRET.to_string(),
            price_updated_at,
        }
    }
}

/// Persistence collaborator for [`ExchangeSettings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the current settings, creating defaults when none exist yet.
    async fn load(&self) -> Result<ExchangeSettings>;

    /// Replaces the rate while preserving the stored secret.
    async fn save_rate(&self, rate: f64) -> Result<ExchangeSettings>;
}
