use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::PreferenceRecord;

/// Onboarding submission. Fields are optional so missing ones surface as a
/// 400 with a field-level message rather than a body-rejection error.
#[derive(Debug, Deserialize)]
pub struct SavePreferencesRequest {
    pub interested_assets: Option<Vec<String>>,
    pub investor_type: Option<String>,
    pub content_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub id: Uuid,
    pub interested_assets: Vec<String>,
    pub investor_type: String,
    pub content_types: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PreferenceRecord> for PreferencesResponse {
    fn from(record: PreferenceRecord) -> Self {
        Self {
            id: record.id,
            interested_assets: record.assets(),
            investor_type: record.investor_type.clone(),
            content_types: record.categories(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub message: String,
    pub id: Uuid,
}
