use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One onboarding submission. Records are append-only; the user's current
/// preferences are the most recently created row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreferenceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// JSON-encoded array of asset identifiers.
    pub interested_assets: String,
    pub investor_type: String,
    /// JSON-encoded array of content category names.
    pub content_types: String,
    pub created_at: OffsetDateTime,
}

impl PreferenceRecord {
    pub fn assets(&self) -> Vec<String> {
        serde_json::from_str(&self.interested_assets).unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        serde_json::from_str(&self.content_types).unwrap_or_default()
    }

    /// Most recent record for the user, or None if onboarding was never
    /// completed.
    pub async fn latest_for_user(
        db: &SqlitePool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<PreferenceRecord>> {
        let record = sqlx::query_as::<_, PreferenceRecord>(
            r#"
            SELECT id, user_id, interested_assets, investor_type, content_types, created_at
            FROM user_preferences
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Insert a new record; never updates in place.
    pub async fn insert(
        db: &SqlitePool,
        user_id: Uuid,
        interested_assets: &[String],
        investor_type: &str,
        content_types: &[String],
    ) -> anyhow::Result<PreferenceRecord> {
        let record = PreferenceRecord {
            id: Uuid::new_v4(),
            user_id,
            interested_assets: serde_json::to_string(interested_assets)?,
            investor_type: investor_type.to_string(),
            content_types: serde_json::to_string(content_types)?,
            created_at: OffsetDateTime::now_utc(),
        };
        sqlx::query(
            r#"
            INSERT INTO user_preferences
                (id, user_id, interested_assets, investor_type, content_types, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.interested_assets)
        .bind(&record.investor_type)
        .bind(&record.content_types)
        .bind(record.created_at)
        .execute(db)
        .await?;
        Ok(record)
    }
}
