//! Conversion service: validates requests, reads a consistent settings
//! snapshot, makes sure the market price is fresh and runs the pricing engine.

use super::cache::MarketPriceCache;
use super::error::ExchangeError;
use super::format::{format_amount, round_to};
use super::market::MarketPriceSnapshot;
use super::pricing::{self, Direction};
use super::settings::{SettingsStore, SettingsView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: f64,
    pub direction: Direction,
}

impl ConversionRequest {
    /// Parses untrusted input. The amount is checked before the direction.
    pub fn parse(amount: &str, direction: &str) -> Result<Self, ExchangeError> {
        let parsed = amount
            .trim()
            .parse::<f64>()
            .map_err(|_| ExchangeError::InvalidAmount(amount.to_string()))?;
        let amount = pricing::validate_amount(parsed)?;
        let direction = direction.parse()?;
        Ok(Self { amount, direction })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub direction: Direction,
    pub amount: f64,
    #[serde(rename = "converted")]
    pub converted_amount: f64,
    #[serde(rename = "convertedFormatted")]
    pub formatted_converted_amount: String,
    #[serde(rename = "usdtUsed")]
    pub bridge_units_used: f64,
    #[serde(rename = "usdtIdrPrice")]
    pub market_price_used: f64,
    #[serde(rename = "usdtTzsRate")]
    pub administrator_rate_used: f64,
    pub profit_applied: f64,
    #[serde(rename = "profitAppliedFormatted")]
    pub formatted_profit: String,
    #[serde(rename = "updatedAt")]
    pub price_timestamp: DateTime<Utc>,
}

pub struct ConversionService {
    settings: Arc<dyn SettingsStore>,
    market: MarketPriceCache,
}

impl ConversionService {
    pub fn new(settings: Arc<dyn SettingsStore>, market: MarketPriceCache) -> Self {
        Self { settings, market }
    }

    #[instrument(
        skip(self, request),
        fields(amount = request.amount, direction = %request.direction)
    )]
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ExchangeError> {
        let amount = pricing::validate_amount(request.amount)?;

        // Read once so a concurrent administrator update cannot mix into this quote.
        let settings = self.settings.load().await?;
        let rate = settings.validated_rate()?;

        let snapshot = self.market.get_price().await?;
        let conversion = pricing::convert(amount, request.direction, rate, snapshot.price)?;
        debug!(
            gross = conversion.gross_amount,
            profit = conversion.profit,
            net = conversion.converted_amount,
            "Computed conversion"
        );

        Ok(ConversionResult {
            direction: request.direction,
            amount,
            converted_amount: conversion.converted_amount,
            formatted_converted_amount: format_amount(conversion.converted_amount),
            bridge_units_used: round_to(conversion.bridge_units, 8),
            market_price_used: snapshot.price,
            administrator_rate_used: rate,
            profit_applied: round_to(conversion.profit, 2),
            formatted_profit: format_amount(conversion.profit),
            price_timestamp: snapshot.fetched_at,
        })
    }

    /// Replaces the administrator rate after checking the secret, then clears
    /// the cached market price.
    pub async fn update_rate(
        &self,
        secret: &str,
        rate: f64,
    ) -> Result<SettingsView, ExchangeError> {
        let current = self.settings.load().await?;
        if !current.secret_matches(secret) {
            warn!("Rejected settings update with invalid secret");
            return Err(ExchangeError::AuthFailed);
        }

        if !(rate.is_finite() && rate > 0.0) {
            return Err(ExchangeError::ValidationFailed(rate.to_string()));
        }

        let saved = self.settings.save_rate(rate).await?;
        self.market.invalidate().await;
        info!(rate, "Updated USDT→TZS rate");

        Ok(SettingsView::new(&saved, None))
    }

    /// Like [`Self::update_rate`] for a rate given as text.
    pub async fn update_rate_str(
        &self,
        secret: &str,
        rate: &str,
    ) -> Result<SettingsView, ExchangeError> {
        let parsed = rate.trim().parse::<f64>().unwrap_or(f64::NAN);
        match self.update_rate(secret, parsed).await {
            Err(ExchangeError::ValidationFailed(_)) => {
                Err(ExchangeError::ValidationFailed(rate.to_string()))
            }
            other => other,
        }
    }

    pub async fn settings_view(&self) -> Result<SettingsView, ExchangeError> {
        let settings = self.settings.load().await?;
        let updated_at = self.market.snapshot().await.map(|s| s.fetched_at);
        Ok(SettingsView::new(&settings, updated_at))
    }

    /// Fetches a new market price now, regardless of the cached one.
    pub async fn refresh_market(&self) -> Result<MarketPriceSnapshot, ExchangeError> {
        self.market.refresh().await
    }

    pub fn market(&self) -> &MarketPriceCache {
        &self.market
    }
}
