//! Market price abstractions for the bridge asset

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Bridge asset and the fiat it is priced in, e.g. USDT/IDR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketPair {
    pub asset: String,
    pub fiat: String,
}

impl MarketPair {
    pub fn new(asset: &str, fiat: &str) -> Self {
        Self {
            asset: asset.to_string(),
            fiat: fiat.to_string(),
        }
    }

    /// The only market quoted: USDT priced in IDR.
    pub fn usdt_idr() -> Self {
        Self::new("USDT", "IDR")
    }
}

impl Display for MarketPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.asset, self.fiat)
    }
}

/// Last successfully fetched bridge price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketPriceSnapshot {
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
}

impl MarketPriceSnapshot {
    /// A snapshot stays usable while its age does not exceed `stale_after`.
    pub fn is_fresh(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age <= stale_after,
            // Fetched "in the future" relative to `now`: clock skew, treat as fresh.
            Err(_) => true,
        }
    }
}

/// External source quoting the best offer for a bridge asset.
#[async_trait]
pub trait MarketPriceSource: Send + Sync {
    async fn fetch_best_offer(&self, asset: &str, fiat: &str) -> Result<f64>;
}
