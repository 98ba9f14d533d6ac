use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Thumbs up/down submission for one piece of dashboard content.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub content_type: Option<String>,
    pub content_id: Option<String>,
    pub vote: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackSaved {
    pub message: String,
    pub id: Uuid,
}
