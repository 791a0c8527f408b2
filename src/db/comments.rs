//! Comment manager.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Comment, Page};

/// Creates and soft-deletes comments while keeping `discussion.comments_count` in step.
#[derive(Clone)]
pub struct CommentManager {
    pool: SqlitePool,
}

impl CommentManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to a discussion and return the stored record.
    pub async fn add(
        &self,
        discussion_id: i64,
        user_id: i64,
        content: Option<&str>,
    ) -> Result<Comment, AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO topic_discussion_comment (discussion_id, user_id, content, is_deleted, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(discussion_id)
        .bind(user_id)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE topic_discussion SET comments_count = comments_count + 1 WHERE id = ?")
            .bind(discussion_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let comment = Comment {
            id: result.last_insert_rowid(),
            discussion_id,
            user_id,
            content: content.map(str::to_string),
            is_deleted: false,
            created_at: now,
        };
        tracing::debug!(comment_id = comment.id, discussion_id, "Created comment");
        Ok(comment)
    }

    /// Get a comment by ID, deleted or not.
    #[cfg(test)]
    pub async fn get(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query(
            "SELECT id, discussion_id, user_id, content, is_deleted, created_at FROM topic_discussion_comment WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    /// Soft-delete a comment and decrement its discussion's `comments_count`.
    ///
    /// Returns `false` if the comment does not exist or is already deleted.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "UPDATE topic_discussion_comment SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE topic_discussion SET comments_count = comments_count - 1 WHERE id = (SELECT discussion_id FROM topic_discussion_comment WHERE id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(comment_id = id, "Deleted comment");
        Ok(true)
    }

    /// List live comments of a discussion.
    pub async fn list_for_discussion(
        &self,
        discussion_id: i64,
        page: Page,
    ) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query(
            "SELECT id, discussion_id, user_id, content, is_deleted, created_at FROM topic_discussion_comment WHERE discussion_id = ? AND is_deleted = 0 ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(discussion_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }
}

fn comment_from_row(row: &sqlx::sqlite::SqliteRow) -> Comment {
    let is_deleted: i32 = row.get("is_deleted");
    Comment {
        id: row.get("id"),
        discussion_id: row.get("discussion_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        is_deleted: is_deleted != 0,
        created_at: row.get("created_at"),
    }
}
