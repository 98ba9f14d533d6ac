use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, instrument};

use super::adapter::{FeedAdapter, FeedContext, UpstreamError};

const MAX_ARTICLES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPayload {
    pub news: Vec<NewsArticle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Headlines via the CryptoPanic posts endpoint, filtered to the user's
/// preferred currencies.
pub struct NewsAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    results: Option<Vec<Post>>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<PostSource>,
}

#[derive(Debug, Deserialize)]
struct PostSource {
    title: String,
}

/// CoinGecko-style asset ids to ticker symbols; unknown ids are skipped.
fn asset_symbol(id: &str) -> Option<&'static str> {
    match id {
        "bitcoin" => Some("BTC"),
        "ethereum" => Some("ETH"),
        "solana" => Some("SOL"),
        "cardano" => Some("ADA"),
        "dogecoin" => Some("DOGE"),
        "ripple" => Some("XRP"),
        "polkadot" => Some("DOT"),
        "chainlink" => Some("LINK"),
        _ => None,
    }
}

impl NewsAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    fn currencies(ctx: &FeedContext) -> String {
        let symbols: Vec<&str> = ctx
            .preferences
            .iter()
            .flat_map(|p| p.interested_assets.iter())
            .filter_map(|id| asset_symbol(id))
            .collect();
        if symbols.is_empty() {
            "BTC,ETH".to_string()
        } else {
            symbols.join(",")
        }
    }
}

#[async_trait]
impl FeedAdapter for NewsAdapter {
    type Payload = NewsPayload;

    fn name(&self) -> &'static str {
        "news"
    }

    #[instrument(name = "news_fetch", skip(self, ctx))]
    async fn fetch(&self, ctx: &FeedContext) -> Result<NewsPayload, UpstreamError> {
        let currencies = Self::currencies(ctx);
        let url = format!("{}/api/v1/posts/", self.base_url);
        debug!(%url, %currencies, "requesting news");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("auth_token", self.api_key.as_deref().unwrap_or("")),
                ("public", "true"),
                ("filter", "hot"),
                ("currencies", currencies.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let posts: PostsResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let results = posts.results.unwrap_or_default();
        if results.is_empty() {
            return Err(UpstreamError::Empty);
        }

        let news = results
            .into_iter()
            .take(MAX_ARTICLES)
            .map(|post| NewsArticle {
                title: post.title,
                url: post.url.unwrap_or_else(|| "#".into()),
                published_at: post.published_at.unwrap_or_default(),
                source: post
                    .source
                    .map(|s| s.title)
                    .unwrap_or_else(|| "Unknown".into()),
            })
            .collect();
        Ok(NewsPayload {
            news,
            note: None,
        })
    }

    fn fallback(&self, _ctx: &FeedContext) -> NewsPayload {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        NewsPayload {
            news: vec![
                NewsArticle {
                    title: "Bitcoin reaches new highs".into(),
                    url: "#".into(),
                    published_at: now.clone(),
                    source: "Crypto News".into(),
                },
                NewsArticle {
                    title: "Ethereum upgrade successful".into(),
                    url: "#".into(),
                    published_at: now,
                    source: "Crypto News".into(),
                },
            ],
            note: Some("Live news unavailable; showing placeholder headlines.".into()),
        }
    }
}
