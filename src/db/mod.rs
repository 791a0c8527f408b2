//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data. Every manager holds
//! a clone of the same pool; there is no process-wide handle.

mod comments;
mod discussions;
mod members;
mod topics;

pub use comments::*;
pub use discussions::*;
pub use members::*;
pub use topics::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::MAX_TITLE_LEN;

/// The four entity managers sharing one transactional store.
#[derive(Clone)]
pub struct Repository {
    pub topics: TopicRegistry,
    pub members: MembershipManager,
    pub discussions: DiscussionManager,
    pub comments: CommentManager,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            topics: TopicRegistry::new(pool.clone()),
            members: MembershipManager::new(pool.clone()),
            discussions: DiscussionManager::new(pool.clone()),
            comments: CommentManager::new(pool),
        }
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(
    db_path: &Path,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topic (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            members_count INTEGER NOT NULL DEFAULT 0 CHECK (members_count >= 0),
            discussions_count INTEGER NOT NULL DEFAULT 0 CHECK (discussions_count >= 0),
            created_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topic_member (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_id INTEGER NOT NULL REFERENCES topic(id),
            user_id INTEGER NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            CONSTRAINT ux_topic_member UNIQUE (user_id, topic_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    let discussion_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS topic_discussion (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_id INTEGER NOT NULL REFERENCES topic(id),
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND {MAX_TITLE_LEN}),
            content TEXT,
            comments_count INTEGER NOT NULL DEFAULT 0 CHECK (comments_count >= 0),
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        "#
    );
    sqlx::query(&discussion_table).execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topic_discussion_comment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            discussion_id INTEGER NOT NULL REFERENCES topic_discussion(id),
            user_id INTEGER NOT NULL,
            content TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the admin listing and the paginated scans
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS ix_topic_member_admin ON topic_member(topic_id, is_admin);
        CREATE INDEX IF NOT EXISTS ix_discussion_topic ON topic_discussion(topic_id, is_deleted);
        CREATE INDEX IF NOT EXISTS ix_discussion_user ON topic_discussion(user_id, is_deleted);
        CREATE INDEX IF NOT EXISTS ix_comment_discussion ON topic_discussion_comment(discussion_id, is_deleted);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
