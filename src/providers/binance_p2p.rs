use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::market::MarketPriceSource;

const ADV_SEARCH_PATH: &str = "/bapi/c2c/v2/friendly/c2c/adv/search";

/// Quotes the best advertised P2P offer for an asset/fiat pair.
pub struct BinanceP2pProvider {
    base_url: String,
    trade_type: String,
    client: reqwest::Client,
}

impl BinanceP2pProvider {
    pub fn new(base_url: &str, trade_type: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(timeout)
            .build()?;
        Ok(BinanceP2pProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            trade_type: trade_type.to_string(),
            client,
        })
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AdvSearchRequest<'a> {
    page: u32,
    rows: u32,
    asset: &'a str,
    trade_type: &'a str,
    fiat: &'a str,
}

#[derive(Deserialize, Debug)]
struct AdvSearchResponse {
    data: Option<Vec<AdvItem>>,
}

#[derive(Deserialize, Debug)]
struct AdvItem {
    adv: Option<Adv>,
}

#[derive(Deserialize, Debug)]
struct Adv {
    price: String,
}

#[async_trait]
impl MarketPriceSource for BinanceP2pProvider {
    #[instrument(
        name = "BinanceP2pFetch",
        skip(self),
        fields(asset = %asset, fiat = %fiat)
    )]
    async fn fetch_best_offer(&self, asset: &str, fiat: &str) -> Result<f64> {
        let url = format!("{}{}", self.base_url, ADV_SEARCH_PATH);
        debug!("Requesting best P2P offer from {}", url);

        let body = AdvSearchRequest {
            page: 1,
            rows: 1,
            asset,
            trade_type: &self.trade_type,
            fiat,
        };

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "*/*")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for pair: {}/{}", e, asset, fiat))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for pair: {}/{}",
                response.status(),
                asset,
                fiat
            ));
        }

        let text = response.text().await?;
        let data: AdvSearchResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}/{}: {}", asset, fiat, e))?;

        let adv = data
            .data
            .and_then(|items| items.into_iter().next())
            .and_then(|item| item.adv)
            .ok_or_else(|| anyhow!("No P2P offers found for pair: {}/{}", asset, fiat))?;

        let price = adv
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| {
                anyhow!(
                    "Invalid offer price '{}' for pair: {}/{}",
                    adv.price,
                    asset,
                    fiat
                )
            })?;

        debug!(price, "Best P2P offer");
        Ok(price)
    }
}
