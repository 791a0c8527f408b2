//! Topic registry methods.

use serde_json::Value;

use super::{reply, Params};
use crate::db::Repository;
use crate::errors::AppError;

/// tomato.discussion.add_topic() -> topic id
pub async fn add_topic(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&[])?;
    reply(repo.topics.create().await?)
}

/// tomato.discussion.get_topic(topic_id) -> topic | null
pub async fn get_topic(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["topic_id"])?;
    let topic_id: i64 = params.required(0, "topic_id")?;
    reply(repo.topics.get(topic_id).await?)
}
