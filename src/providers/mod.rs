pub mod binance_p2p;
pub mod fixed;

use crate::core::config::ProvidersConfig;
use crate::core::market::MarketPriceSource;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Picks the configured market price source. A fixed price wins over the
/// live source.
pub fn from_config(config: &ProvidersConfig) -> Result<Arc<dyn MarketPriceSource>> {
    if let Some(fixed) = &config.fixed {
        debug!(price = fixed.price, "Using fixed market price");
        return Ok(Arc::new(fixed::FixedPriceSource::new(fixed.price)));
    }

    let binance = config.binance.clone().unwrap_or_default();
    debug!(base_url = %binance.base_url, "Using Binance P2P market price");
    Ok(Arc::new(binance_p2p::BinanceP2pProvider::new(
        &binance.base_url,
        &binance.trade_type,
        Duration::from_secs(binance.timeout_secs),
    )?))
}
