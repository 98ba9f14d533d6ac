use std::time::Duration;

use axum::Router;

use crate::config::FeedConfig;
use crate::state::AppState;

pub mod adapter;
pub mod cache;
pub mod handlers;
pub mod insight;
pub mod meme;
pub mod news;
pub mod prices;

use insight::InsightAdapter;
use meme::MemeAdapter;
use news::NewsAdapter;
use prices::PriceAdapter;

/// The four upstream adapters, sharing one HTTP client with a bounded
/// timeout so no feed call can block past its window.
pub struct Feeds {
    pub prices: PriceAdapter,
    pub news: NewsAdapter,
    pub meme: MemeAdapter,
    pub insight: InsightAdapter,
}

impl Feeds {
    pub fn from_config(config: &FeedConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coinboard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        Ok(Self {
            prices: PriceAdapter::new(
                client.clone(),
                &config.coingecko_base_url,
                config.coingecko_api_key.clone(),
            ),
            news: NewsAdapter::new(
                client.clone(),
                &config.cryptopanic_base_url,
                config.cryptopanic_api_key.clone(),
            ),
            meme: MemeAdapter::new(client.clone(), &config.reddit_base_url),
            insight: InsightAdapter::new(
                client,
                &config.openai_base_url,
                config.openai_api_key.clone(),
            ),
        })
    }
}

pub fn router() -> Router<AppState> {
    handlers::feed_routes()
}
