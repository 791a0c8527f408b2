//! Discussion comment model.

use serde::{Deserialize, Serialize};

/// A comment on a discussion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub discussion_id: i64,
    pub user_id: i64,
    pub content: Option<String>,
    pub is_deleted: bool,
    pub created_at: i64,
}
