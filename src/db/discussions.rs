//! Discussion manager.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Discussion, NewDiscussion, Page};

const DISCUSSION_COLUMNS: &str =
    "id, topic_id, user_id, title, content, comments_count, is_deleted, created_at";

/// Creates, edits and soft-deletes discussion threads.
#[derive(Clone)]
pub struct DiscussionManager {
    pool: SqlitePool,
}

impl DiscussionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a discussion and bump the topic's `discussions_count`.
    ///
    /// Title length is enforced by the store; an empty or overlong title
    /// fails the insert and nothing is written.
    pub async fn add(&self, request: &NewDiscussion) -> Result<i64, AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO topic_discussion (topic_id, user_id, title, content, comments_count, is_deleted, created_at) VALUES (?, ?, ?, ?, 0, 0, ?)",
        )
        .bind(request.topic_id)
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE topic SET discussions_count = discussions_count + 1 WHERE id = ?")
            .bind(request.topic_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        tracing::debug!(discussion_id = id, topic_id = request.topic_id, "Created discussion");
        Ok(id)
    }

    /// Get a discussion by ID, deleted or not.
    pub async fn get(&self, id: i64) -> Result<Option<Discussion>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM topic_discussion WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(discussion_from_row))
    }

    /// Soft-delete a discussion.
    ///
    /// `discussions_count` on the topic is left untouched.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE topic_discussion SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite title and content.
    pub async fn update(
        &self,
        id: i64,
        title: &str,
        content: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE topic_discussion SET title = ?, content = ? WHERE id = ?")
            .bind(title)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List live discussions of a topic.
    pub async fn list_for_topic(
        &self,
        topic_id: i64,
        page: Page,
    ) -> Result<Vec<Discussion>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM topic_discussion WHERE topic_id = ? AND is_deleted = 0 ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(topic_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(discussion_from_row).collect())
    }

    /// List live discussions started by a user.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<Discussion>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM topic_discussion WHERE user_id = ? AND is_deleted = 0 ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(discussion_from_row).collect())
    }
}

fn discussion_from_row(row: &sqlx::sqlite::SqliteRow) -> Discussion {
    let is_deleted: i32 = row.get("is_deleted");
    Discussion {
        id: row.get("id"),
        topic_id: row.get("topic_id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        comments_count: row.get("comments_count"),
        is_deleted: is_deleted != 0,
        created_at: row.get("created_at"),
    }
}
