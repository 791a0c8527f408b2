//! Topic model.

use serde::{Deserialize, Serialize};

/// A discussion forum with cached membership and discussion counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    /// Number of memberships with `is_deleted = false`
    pub members_count: i64,
    /// Number of discussions ever created in this topic
    pub discussions_count: i64,
    pub created_at: i64,
}
