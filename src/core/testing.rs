//! Deterministic collaborators shared by unit tests.

use super::market::MarketPriceSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Price source returning scripted prices and counting calls.
pub struct StubPriceSource {
    price: Mutex<Option<f64>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubPriceSource {
    pub fn new(price: f64) -> Self {
        Self::with_delay(price, Duration::ZERO)
    }

    pub fn with_delay(price: f64, delay: Duration) -> Self {
        Self {
            price: Mutex::new(Some(price)),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// `None` makes subsequent fetches fail.
    pub fn set_price(&self, price: Option<f64>) {
        *self.price.lock().unwrap() = price;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketPriceSource for StubPriceSource {
    async fn fetch_best_offer(&self, asset: &str, fiat: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let price = *self.price.lock().unwrap();
        price.ok_or_else(|| anyhow!("No P2P offers found for {asset}/{fiat}"))
    }
}
