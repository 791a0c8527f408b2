//! Membership manager.
//!
//! The `(user_id, topic_id)` unique constraint is the only guard against
//! duplicate memberships. Inserts are never preceded by an existence check;
//! a conflicting insert is detected from the store's error and turned into
//! a rejoin of the existing row.

use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{Page, TopicMember};

const MEMBER_COLUMNS: &str =
    "id, topic_id, user_id, is_admin, is_deleted, updated_at, created_at";

/// Kind of constraint conflict reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    UniqueViolation,
}

/// Failure of the membership insert primitive.
#[derive(Debug)]
pub enum InsertMemberError {
    /// The store rejected the row because of a constraint the caller can handle
    Conflict(ConflictKind),
    /// Any other storage failure
    Database(sqlx::Error),
}

impl From<sqlx::Error> for InsertMemberError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                InsertMemberError::Conflict(ConflictKind::UniqueViolation)
            }
            other => InsertMemberError::Database(other),
        }
    }
}

/// Adds, removes and promotes topic members while keeping `topic.members_count` in step.
#[derive(Clone)]
pub struct MembershipManager {
    pool: SqlitePool,
}

impl MembershipManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a user to a topic, reusing the existing row if the user was a member before.
    pub async fn add(&self, user_id: i64, topic_id: i64) -> Result<TopicMember, AppError> {
        let mut tx = self.pool.begin().await?;

        match insert_member(&mut tx, user_id, topic_id).await {
            Ok(member) => {
                adjust_members_count(&mut tx, topic_id, 1).await?;
                tx.commit().await?;
                tracing::debug!(user_id, topic_id, member_id = member.id, "Added member");
                Ok(member)
            }
            Err(InsertMemberError::Conflict(ConflictKind::UniqueViolation)) => {
                tx.rollback().await?;
                tracing::debug!(user_id, topic_id, "Membership row exists, rejoining");
                self.rejoin(user_id, topic_id).await
            }
            Err(InsertMemberError::Database(err)) => Err(err.into()),
        }
    }

    /// Reactivate an existing membership row in a fresh transaction.
    ///
    /// The counter only moves when the row actually flips from removed to active,
    /// so adding a user who is already an active member changes nothing.
    async fn rejoin(&self, user_id: i64, topic_id: i64) -> Result<TopicMember, AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let reactivated = sqlx::query(
            "UPDATE topic_member SET is_deleted = 0, updated_at = ? WHERE user_id = ? AND topic_id = ? AND is_deleted = 1",
        )
        .bind(now)
        .bind(user_id)
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;

        if reactivated.rows_affected() > 0 {
            adjust_members_count(&mut tx, topic_id, 1).await?;
        }

        let member = find_member(&mut tx, user_id, topic_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Membership of user {} in topic {} vanished during rejoin",
                    user_id, topic_id
                ))
            })?;

        tx.commit().await?;
        Ok(member)
    }

    /// Soft-remove a member.
    ///
    /// Returns `false` when the user never joined the topic and `true` otherwise,
    /// including when the membership was already removed.
    pub async fn remove(&self, user_id: i64, topic_id: i64) -> Result<bool, AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "UPDATE topic_member SET is_deleted = 1, is_admin = 0, updated_at = ? WHERE user_id = ? AND topic_id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(user_id)
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            let exists = find_member(&mut tx, user_id, topic_id).await?.is_some();
            return Ok(exists);
        }

        adjust_members_count(&mut tx, topic_id, -1).await?;
        tx.commit().await?;

        tracing::debug!(user_id, topic_id, "Removed member");
        Ok(true)
    }

    /// Mark a membership as admin. Does not look at `is_deleted`.
    pub async fn grant_admin(&self, user_id: i64, topic_id: i64) -> Result<bool, AppError> {
        self.set_admin(user_id, topic_id, true).await
    }

    /// Clear the admin flag of a membership. Does not look at `is_deleted`.
    pub async fn revoke_admin(&self, user_id: i64, topic_id: i64) -> Result<bool, AppError> {
        self.set_admin(user_id, topic_id, false).await
    }

    async fn set_admin(
        &self,
        user_id: i64,
        topic_id: i64,
        is_admin: bool,
    ) -> Result<bool, AppError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "UPDATE topic_member SET is_admin = ?, updated_at = ? WHERE user_id = ? AND topic_id = ?",
        )
        .bind(is_admin as i32)
        .bind(now)
        .bind(user_id)
        .bind(topic_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the membership row for a pair, removed or not.
    #[cfg(test)]
    pub async fn get(
        &self,
        user_id: i64,
        topic_id: i64,
    ) -> Result<Option<TopicMember>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_member(&mut conn, user_id, topic_id).await?)
    }

    /// List every admin row of a topic.
    pub async fn list_admins(&self, topic_id: i64) -> Result<Vec<TopicMember>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM topic_member WHERE topic_id = ? AND is_admin = 1 ORDER BY id"
        ))
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(member_from_row).collect())
    }

    /// List one page of non-admin rows of a topic.
    pub async fn list_non_admins(
        &self,
        topic_id: i64,
        page: Page,
    ) -> Result<Vec<TopicMember>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM topic_member WHERE topic_id = ? AND is_admin = 0 ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(topic_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(member_from_row).collect())
    }
}

/// Insert a fresh membership row, reporting unique conflicts separately.
async fn insert_member(
    conn: &mut SqliteConnection,
    user_id: i64,
    topic_id: i64,
) -> Result<TopicMember, InsertMemberError> {
    let now = Utc::now().timestamp();

    let result = sqlx::query(
        "INSERT INTO topic_member (topic_id, user_id, is_admin, is_deleted, updated_at, created_at) VALUES (?, ?, 0, 0, ?, ?)",
    )
    .bind(topic_id)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(TopicMember {
        id: result.last_insert_rowid(),
        topic_id,
        user_id,
        is_admin: false,
        is_deleted: false,
        updated_at: now,
        created_at: now,
    })
}

async fn find_member(
    conn: &mut SqliteConnection,
    user_id: i64,
    topic_id: i64,
) -> Result<Option<TopicMember>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {MEMBER_COLUMNS} FROM topic_member WHERE user_id = ? AND topic_id = ?"
    ))
    .bind(user_id)
    .bind(topic_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.as_ref().map(member_from_row))
}

async fn adjust_members_count(
    conn: &mut SqliteConnection,
    topic_id: i64,
    delta: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE topic SET members_count = members_count + ? WHERE id = ?")
        .bind(delta)
        .bind(topic_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> TopicMember {
    let is_admin: i32 = row.get("is_admin");
    let is_deleted: i32 = row.get("is_deleted");
    TopicMember {
        id: row.get("id"),
        topic_id: row.get("topic_id"),
        user_id: row.get("user_id"),
        is_admin: is_admin != 0,
        is_deleted: is_deleted != 0,
        updated_at: row.get("updated_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::db::test_support::test_repository;
    use crate::db::Repository;
    use crate::models::Page;

    async fn active_members(repo: &Repository, topic_id: i64) -> i64 {
        let mut all = repo.members.list_admins(topic_id).await.unwrap();
        all.extend(
            repo.members
                .list_non_admins(topic_id, Page::new(0, 1000))
                .await
                .unwrap(),
        );
        all.iter().filter(|m| !m.is_deleted).count() as i64
    }

    async fn members_count(repo: &Repository, topic_id: i64) -> i64 {
        repo.topics.get(topic_id).await.unwrap().unwrap().members_count
    }

    #[tokio::test]
    async fn test_add_member() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        let member = repo.members.add(7, topic_id).await.unwrap();

        assert_eq!(member.user_id, 7);
        assert_eq!(member.topic_id, topic_id);
        assert!(!member.is_admin);
        assert!(!member.is_deleted);
        assert_eq!(members_count(&repo, topic_id).await, 1);
        assert_eq!(repo.members.get(7, topic_id).await.unwrap(), Some(member));
    }

    #[tokio::test]
    async fn test_remove_then_rejoin_reuses_row() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        let first = repo.members.add(7, topic_id).await.unwrap();
        assert!(repo.members.remove(7, topic_id).await.unwrap());
        assert_eq!(members_count(&repo, topic_id).await, 0);

        let removed = repo.members.get(7, topic_id).await.unwrap().unwrap();
        assert!(removed.is_deleted);

        let again = repo.members.add(7, topic_id).await.unwrap();
        assert_eq!(again.id, first.id);
        assert!(!again.is_deleted);
        assert_eq!(members_count(&repo, topic_id).await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();
        repo.members.add(7, topic_id).await.unwrap();
        repo.members.add(8, topic_id).await.unwrap();

        assert!(repo.members.remove(7, topic_id).await.unwrap());
        assert!(repo.members.remove(7, topic_id).await.unwrap());

        assert_eq!(members_count(&repo, topic_id).await, 1);
    }

    #[tokio::test]
    async fn test_remove_non_member_returns_false() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        assert!(!repo.members.remove(7, topic_id).await.unwrap());
        assert_eq!(members_count(&repo, topic_id).await, 0);
    }

    #[tokio::test]
    async fn test_remove_clears_admin() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();
        repo.members.add(7, topic_id).await.unwrap();
        assert!(repo.members.grant_admin(7, topic_id).await.unwrap());

        repo.members.remove(7, topic_id).await.unwrap();

        let member = repo.members.get(7, topic_id).await.unwrap().unwrap();
        assert!(!member.is_admin);
        assert!(repo.members.list_admins(topic_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adding_active_member_twice_keeps_count() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        let first = repo.members.add(7, topic_id).await.unwrap();
        let second = repo.members.add(7, topic_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(members_count(&repo, topic_id).await, 1);
    }

    #[tokio::test]
    async fn test_add_member_to_missing_topic_fails() {
        let (repo, _dir) = test_repository().await;

        let result = repo.members.add(7, 999).await;

        assert!(result.is_err());
        assert!(repo.members.get(7, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grant_admin_without_membership() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        assert!(!repo.members.grant_admin(7, topic_id).await.unwrap());
        assert!(!repo.members.revoke_admin(7, topic_id).await.unwrap());
        assert!(repo.members.get(7, topic_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grant_and_revoke_admin() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();
        repo.members.add(1, topic_id).await.unwrap();
        repo.members.add(2, topic_id).await.unwrap();
        repo.members.add(3, topic_id).await.unwrap();

        assert!(repo.members.grant_admin(2, topic_id).await.unwrap());

        let admins = repo.members.list_admins(topic_id).await.unwrap();
        assert_eq!(admins.iter().map(|m| m.user_id).collect::<Vec<_>>(), vec![2]);

        let others = repo
            .members
            .list_non_admins(topic_id, Page::default())
            .await
            .unwrap();
        assert_eq!(others.iter().map(|m| m.user_id).collect::<Vec<_>>(), vec![1, 3]);

        assert!(repo.members.revoke_admin(2, topic_id).await.unwrap());
        assert!(repo.members.list_admins(topic_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_flag_reachable_on_removed_member() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();
        repo.members.add(7, topic_id).await.unwrap();
        repo.members.remove(7, topic_id).await.unwrap();

        assert!(repo.members.grant_admin(7, topic_id).await.unwrap());

        let admins = repo.members.list_admins(topic_id).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert!(admins[0].is_deleted);
        assert_eq!(members_count(&repo, topic_id).await, 0);
    }

    #[tokio::test]
    async fn test_non_admin_pagination() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();
        for user_id in 1..=25 {
            repo.members.add(user_id, topic_id).await.unwrap();
        }

        let first = repo
            .members
            .list_non_admins(topic_id, Page::default())
            .await
            .unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first[0].user_id, 1);

        let rest = repo
            .members
            .list_non_admins(topic_id, Page::new(20, 20))
            .await
            .unwrap();
        assert_eq!(
            rest.iter().map(|m| m.user_id).collect::<Vec<_>>(),
            vec![21, 22, 23, 24, 25]
        );
    }

    #[tokio::test]
    async fn test_counter_matches_rows_after_mixed_sequence() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        for user_id in 1..=6 {
            repo.members.add(user_id, topic_id).await.unwrap();
        }
        for user_id in [2, 4, 4, 9] {
            repo.members.remove(user_id, topic_id).await.unwrap();
        }
        for user_id in [4, 5, 10] {
            repo.members.add(user_id, topic_id).await.unwrap();
        }
        repo.members.remove(1, topic_id).await.unwrap();

        let expected = active_members(&repo, topic_id).await;
        assert_eq!(expected, 5);
        assert_eq!(members_count(&repo, topic_id).await, expected);
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_same_pair_create_one_row() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.members.add(7, topic_id).await
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(ids.len(), 1);
        assert_eq!(members_count(&repo, topic_id).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_distinct_users() {
        let (repo, _dir) = test_repository().await;
        let topic_id = repo.topics.create().await.unwrap();

        let mut handles = Vec::new();
        for user_id in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.members.add(user_id, topic_id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(members_count(&repo, topic_id).await, 16);
    }
}
