use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{auth::extractors::AuthUser, preferences::repo::PreferenceRecord, state::AppState};

use super::adapter::{cached_fetch, FeedContext, PreferenceSnapshot};
use super::insight::InsightPayload;
use super::meme::MemePayload;
use super::news::NewsPayload;
use super::prices::PricesPayload;

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/prices", get(prices))
        .route("/dashboard/news", get(news))
        .route("/dashboard/insight", get(insight))
        .route("/dashboard/meme", get(meme))
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    refresh: Option<String>,
}

impl RefreshQuery {
    fn force(&self) -> bool {
        matches!(self.refresh.as_deref(), Some("1") | Some("true"))
    }
}

/// Builds the adapter context from the user's current preferences. A store
/// error here degrades to unpersonalized feeds rather than failing the
/// request; feed routes never hard-fail.
async fn feed_context(state: &AppState, user_id: Uuid) -> FeedContext {
    match PreferenceRecord::latest_for_user(&state.db, user_id).await {
        Ok(record) => FeedContext {
            preferences: record.as_ref().map(PreferenceSnapshot::from),
        },
        Err(e) => {
            warn!(error = %e, %user_id, "preference lookup failed; serving unpersonalized feeds");
            FeedContext::default()
        }
    }
}

fn user_key(user_id: Uuid, feed: &str) -> String {
    format!("user:{user_id}:{feed}")
}

#[instrument(skip(state))]
pub async fn prices(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<RefreshQuery>,
) -> Json<PricesPayload> {
    let ctx = feed_context(&state, user_id).await;
    let result = cached_fetch(
        &state.cache,
        &state.feeds.prices,
        &ctx,
        &user_key(user_id, "prices"),
        state.config.feeds.prices_ttl(),
        query.force(),
    )
    .await;
    Json(result.payload)
}

#[instrument(skip(state))]
pub async fn news(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<RefreshQuery>,
) -> Json<NewsPayload> {
    let ctx = feed_context(&state, user_id).await;
    let result = cached_fetch(
        &state.cache,
        &state.feeds.news,
        &ctx,
        &user_key(user_id, "news"),
        state.config.feeds.news_ttl(),
        query.force(),
    )
    .await;
    Json(result.payload)
}

#[instrument(skip(state))]
pub async fn insight(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<InsightPayload> {
    let ctx = feed_context(&state, user_id).await;
    let result = cached_fetch(
        &state.cache,
        &state.feeds.insight,
        &ctx,
        &user_key(user_id, "insight"),
        state.config.feeds.insight_ttl(),
        false,
    )
    .await;
    Json(result.payload)
}

/// The meme feed is not personalized; it shares one cache entry across users.
#[instrument(skip(state))]
pub async fn meme(State(state): State<AppState>, AuthUser(_user_id): AuthUser) -> Json<MemePayload> {
    let result = cached_fetch(
        &state.cache,
        &state.feeds.meme,
        &FeedContext::default(),
        "meme",
        state.config.feeds.meme_ttl(),
        false,
    )
    .await;
    Json(result.payload)
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub prices: PricesPayload,
    pub news: NewsPayload,
    pub meme: MemePayload,
    pub insight: InsightPayload,
}

/// One dashboard load: the four feeds fetched concurrently and all awaited.
/// Each call absorbs its own upstream failure, so one flaky provider
/// degrades only its section of the response.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<DashboardResponse> {
    let ctx = feed_context(&state, user_id).await;
    let feeds = &state.config.feeds;
    let prices_key = user_key(user_id, "prices");
    let news_key = user_key(user_id, "news");
    let insight_key = user_key(user_id, "insight");
    let meme_ctx = FeedContext::default();

    let (prices, news, meme, insight) = tokio::join!(
        cached_fetch(
            &state.cache,
            &state.feeds.prices,
            &ctx,
            &prices_key,
            feeds.prices_ttl(),
            false,
        ),
        cached_fetch(
            &state.cache,
            &state.feeds.news,
            &ctx,
            &news_key,
            feeds.news_ttl(),
            false,
        ),
        cached_fetch(
            &state.cache,
            &state.feeds.meme,
            &meme_ctx,
            "meme",
            feeds.meme_ttl(),
            false,
        ),
        cached_fetch(
            &state.cache,
            &state.feeds.insight,
            &ctx,
            &insight_key,
            feeds.insight_ttl(),
            false,
        ),
    );

    Json(DashboardResponse {
        prices: prices.payload,
        news: news.payload,
        meme: meme.payload,
        insight: insight.payload,
    })
}
