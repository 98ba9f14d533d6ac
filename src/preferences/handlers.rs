use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
};

use super::dto::{PreferencesResponse, SavePreferencesRequest, SavedResponse};
use super::repo::PreferenceRecord;

pub fn preference_routes() -> Router<AppState> {
    Router::new().route(
        "/dashboard/preferences",
        get(get_preferences).post(save_preferences),
    )
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Option<PreferencesResponse>>, ApiError> {
    let record = PreferenceRecord::latest_for_user(&state.db, user_id).await?;
    Ok(Json(record.map(PreferencesResponse::from)))
}

/// Strict validation: all three fields required, lists must be non-empty.
#[instrument(skip(state, payload))]
pub async fn save_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SavePreferencesRequest>,
) -> Result<Json<SavedResponse>, ApiError> {
    let assets = match payload.interested_assets {
        Some(a) if !a.is_empty() => a,
        _ => {
            return Err(ApiError::Validation(
                "interested_assets must be a non-empty list".into(),
            ))
        }
    };
    let investor_type = match payload.investor_type {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ApiError::Validation("investor_type is required".into())),
    };
    let content_types = match payload.content_types {
        Some(c) if !c.is_empty() => c,
        _ => {
            return Err(ApiError::Validation(
                "content_types must be a non-empty list".into(),
            ))
        }
    };

    let record =
        PreferenceRecord::insert(&state.db, user_id, &assets, &investor_type, &content_types)
            .await?;

    // Drop this user's cached feed results so the next read reflects the
    // new preferences.
    state
        .cache
        .invalidate_prefix(&format!("user:{user_id}:"))
        .await;

    info!(user_id = %user_id, record_id = %record.id, "preferences saved");
    Ok(Json(SavedResponse {
        message: "Preferences saved successfully".into(),
        id: record.id,
    }))
}
