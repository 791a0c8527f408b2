//! Topic membership model.

use serde::{Deserialize, Serialize};

/// A user's association with a topic.
///
/// At most one row exists per `(user_id, topic_id)`. Removal flips
/// `is_deleted` and re-adding the same user flips it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicMember {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: i64,
    pub is_admin: bool,
    pub is_deleted: bool,
    pub updated_at: i64,
    pub created_at: i64,
}
