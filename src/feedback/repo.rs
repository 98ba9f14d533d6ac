use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One recorded vote. Append-only; the same user may vote on the same
/// content any number of times (no uniqueness constraint, on purpose).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_type: String,
    pub content_id: String,
    pub vote: i64,
    pub created_at: OffsetDateTime,
}

impl FeedbackEntry {
    pub async fn insert(
        db: &SqlitePool,
        user_id: Uuid,
        content_type: &str,
        content_id: &str,
        vote: i64,
    ) -> anyhow::Result<FeedbackEntry> {
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            user_id,
            content_type: content_type.to_string(),
            content_id: content_id.to_string(),
            vote,
            created_at: OffsetDateTime::now_utc(),
        };
        sqlx::query(
            r#"
            INSERT INTO feedback (id, user_id, content_type, content_id, vote, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.content_type)
        .bind(&entry.content_id)
        .bind(entry.vote)
        .bind(entry.created_at)
        .execute(db)
        .await?;
        Ok(entry)
    }

    /// No read API is exposed over HTTP; this exists for admin scripts and
    /// tests.
    pub async fn list_for_user(
        db: &SqlitePool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<FeedbackEntry>> {
        let rows = sqlx::query_as::<_, FeedbackEntry>(
            r#"
            SELECT id, user_id, content_type, content_id, vote, created_at
            FROM feedback
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
