use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::adapter::{FeedAdapter, FeedContext, UpstreamError};

/// Assets shown before onboarding is completed.
const DEFAULT_ASSETS: [&str; 3] = ["bitcoin", "ethereum", "solana"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceEntry {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesPayload {
    pub prices: Vec<PriceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Market data via the CoinGecko markets endpoint.
pub struct PriceAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    name: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
}

impl PriceAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    fn asset_ids(ctx: &FeedContext) -> Vec<String> {
        match &ctx.preferences {
            Some(prefs) if !prefs.interested_assets.is_empty() => prefs.interested_assets.clone(),
            _ => DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl FeedAdapter for PriceAdapter {
    type Payload = PricesPayload;

    fn name(&self) -> &'static str {
        "prices"
    }

    #[instrument(name = "prices_fetch", skip(self, ctx))]
    async fn fetch(&self, ctx: &FeedContext) -> Result<PricesPayload, UpstreamError> {
        let ids = Self::asset_ids(ctx).join(",");
        let url = format!("{}/api/v3/coins/markets", self.base_url);
        debug!(%url, %ids, "requesting market data");

        let mut request = self
            .client
            .get(&url)
            .query(&[("vs_currency", "usd"), ("ids", ids.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("x_cg_demo_api_key", key.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let markets: Vec<MarketEntry> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        if markets.is_empty() {
            return Err(UpstreamError::Empty);
        }

        let prices = markets
            .into_iter()
            .map(|m| PriceEntry {
                id: m.id,
                name: m.name,
                price: m.current_price.unwrap_or_default(),
                change_24h: m.price_change_percentage_24h.unwrap_or_default(),
            })
            .collect();
        Ok(PricesPayload {
            prices,
            note: None,
        })
    }

    fn fallback(&self, _ctx: &FeedContext) -> PricesPayload {
        PricesPayload {
            prices: vec![
                PriceEntry {
                    id: "bitcoin".into(),
                    name: "Bitcoin".into(),
                    price: 65000.0,
                    change_24h: 1.8,
                },
                PriceEntry {
                    id: "ethereum".into(),
                    name: "Ethereum".into(),
                    price: 3200.0,
                    change_24h: -0.6,
                },
                PriceEntry {
                    id: "solana".into(),
                    name: "Solana".into(),
                    price: 145.0,
                    change_24h: 3.1,
                },
            ],
            note: Some("Live prices unavailable; showing indicative values.".into()),
        }
    }
}
