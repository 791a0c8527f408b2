//! Discussion thread model.

use serde::{Deserialize, Serialize};

/// Maximum title length accepted by the store.
pub const MAX_TITLE_LEN: usize = 255;

/// A thread within a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discussion {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub comments_count: i64,
    pub is_deleted: bool,
    pub created_at: i64,
}

/// Fields for creating a discussion.
#[derive(Debug, Clone)]
pub struct NewDiscussion {
    pub topic_id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: Option<String>,
}
