use anyhow::Result;
use async_trait::async_trait;

use crate::core::market::MarketPriceSource;

/// A price source that always quotes the configured price
pub struct FixedPriceSource {
    price: f64,
}

impl FixedPriceSource {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl MarketPriceSource for FixedPriceSource {
    async fn fetch_best_offer(&self, _asset: &str, _fiat: &str) -> Result<f64> {
        Ok(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_source() {
        let source = FixedPriceSource::new(16_200.0);
        assert_eq!(source.fetch_best_offer("USDT", "IDR").await.unwrap(), 16_200.0);
    }
}
