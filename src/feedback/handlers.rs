use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState};

use super::dto::{FeedbackRequest, FeedbackSaved};
use super::repo::FeedbackEntry;

pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/dashboard/feedback", post(submit_feedback))
}

#[instrument(skip(state, payload))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackSaved>, ApiError> {
    let content_type = match payload.content_type {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ApiError::Validation("content_type is required".into())),
    };
    let content_id = match payload.content_id {
        Some(i) if !i.trim().is_empty() => i,
        _ => return Err(ApiError::Validation("content_id is required".into())),
    };
    let vote = match payload.vote {
        Some(v @ (1 | -1)) => v,
        _ => return Err(ApiError::Validation("Vote must be 1 or -1".into())),
    };

    let entry = FeedbackEntry::insert(&state.db, user_id, &content_type, &content_id, vote).await?;

    info!(user_id = %user_id, entry_id = %entry.id, vote, "feedback recorded");
    Ok(Json(FeedbackSaved {
        message: "Feedback saved successfully".into(),
        id: entry.id,
    }))
}
