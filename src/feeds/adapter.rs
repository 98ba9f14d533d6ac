use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::preferences::repo::PreferenceRecord;

use super::cache::ResponseCache;

/// Per-request context handed to adapters. Prices, news and insight read the
/// user's current preferences; the meme feed ignores it.
#[derive(Debug, Clone, Default)]
pub struct FeedContext {
    pub preferences: Option<PreferenceSnapshot>,
}

/// Decoded view of a `PreferenceRecord`, detached from the store.
#[derive(Debug, Clone)]
pub struct PreferenceSnapshot {
    pub interested_assets: Vec<String>,
    pub investor_type: String,
    pub content_types: Vec<String>,
}

impl From<&PreferenceRecord> for PreferenceSnapshot {
    fn from(record: &PreferenceRecord) -> Self {
        Self {
            interested_assets: record.assets(),
            investor_type: record.investor_type.clone(),
            content_types: record.categories(),
        }
    }
}

/// Why an upstream call produced no usable payload. Never surfaced to HTTP
/// callers; every variant ends in the adapter's fallback.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no usable data in response")]
    Empty,
    #[error("provider not configured")]
    NotConfigured,
}

/// One external data provider behind a normalized, failure-tolerant
/// interface. `fetch` may fail; `fallback` may not.
#[async_trait]
pub trait FeedAdapter: Send + Sync {
    type Payload: Clone + Serialize + DeserializeOwned + Send + Sync;

    fn name(&self) -> &'static str;

    async fn fetch(&self, ctx: &FeedContext) -> Result<Self::Payload, UpstreamError>;

    fn fallback(&self, ctx: &FeedContext) -> Self::Payload;
}

/// How a feed response was produced. Lets tests tell live data from fallback
/// data deterministically instead of sniffing note strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Live,
    Cached,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct FeedResult<T> {
    pub payload: T,
    pub served: Served,
}

/// The one cache/fetch/fallback policy shared by every feed route:
/// serve a fresh cache entry unless `refresh` is set, otherwise call the
/// adapter; live results are cached, fallbacks are not, and no error ever
/// escapes to the caller. There is no retry; a failed call goes straight to
/// the fallback payload.
pub async fn cached_fetch<A: FeedAdapter>(
    cache: &ResponseCache,
    adapter: &A,
    ctx: &FeedContext,
    key: &str,
    ttl: Duration,
    refresh: bool,
) -> FeedResult<A::Payload> {
    if !refresh {
        if let Some(value) = cache.get(key).await {
            match serde_json::from_value(value) {
                Ok(payload) => {
                    return FeedResult {
                        payload,
                        served: Served::Cached,
                    }
                }
                Err(e) => {
                    warn!(feed = adapter.name(), error = %e, "dropping undecodable cache entry");
                    cache.invalidate(key).await;
                }
            }
        }
    }

    match adapter.fetch(ctx).await {
        Ok(payload) => {
            if let Ok(value) = serde_json::to_value(&payload) {
                cache.put(key, value, ttl).await;
            }
            debug!(feed = adapter.name(), "served live");
            FeedResult {
                payload,
                served: Served::Live,
            }
        }
        Err(e) => {
            warn!(feed = adapter.name(), error = %e, "upstream failed, serving fallback");
            FeedResult {
                payload: adapter.fallback(ctx),
                served: Served::Fallback,
            }
        }
    }
}
