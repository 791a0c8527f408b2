//! Topic registry.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::Topic;

/// Creates topics and serves point lookups.
#[derive(Clone)]
pub struct TopicRegistry {
    pool: SqlitePool,
}

impl TopicRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a topic with zeroed counters and return its id.
    pub async fn create(&self) -> Result<i64, AppError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO topic (members_count, discussions_count, created_at) VALUES (0, 0, ?)",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(topic_id = id, "Created topic");
        Ok(id)
    }

    /// Get a topic by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Topic>, AppError> {
        let row = sqlx::query(
            "SELECT id, members_count, discussions_count, created_at FROM topic WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(topic_from_row))
    }
}

fn topic_from_row(row: &sqlx::sqlite::SqliteRow) -> Topic {
    Topic {
        id: row.get("id"),
        members_count: row.get("members_count"),
        discussions_count: row.get("discussions_count"),
        created_at: row.get("created_at"),
    }
}
