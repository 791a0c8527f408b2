//! Discussion methods.

use serde_json::Value;

use super::{reply, Params};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::NewDiscussion;

/// tomato.discussion.add_topic_discussion(topic_id, user_id, title, content) -> discussion id
pub async fn add_topic_discussion(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["topic_id", "user_id", "title", "content"])?;
    let request = NewDiscussion {
        topic_id: params.required(0, "topic_id")?,
        user_id: params.required(1, "user_id")?,
        title: params.required(2, "title")?,
        content: params.optional(3, "content")?,
    };
    reply(repo.discussions.add(&request).await?)
}

/// tomato.discussion.get_discussion(discussion_id) -> discussion | null
pub async fn get_discussion(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["discussion_id"])?;
    let discussion_id: i64 = params.required(0, "discussion_id")?;
    reply(repo.discussions.get(discussion_id).await?)
}

/// tomato.discussion.delete_discussion(discussion_id) -> bool
pub async fn delete_discussion(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["discussion_id"])?;
    let discussion_id: i64 = params.required(0, "discussion_id")?;
    reply(repo.discussions.delete(discussion_id).await?)
}

/// tomato.discussion.update_discussion(discussion_id, title, content) -> bool
pub async fn update_discussion(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["discussion_id", "title", "content"])?;
    let discussion_id: i64 = params.required(0, "discussion_id")?;
    let title: String = params.required(1, "title")?;
    let content: Option<String> = params.optional(2, "content")?;
    reply(
        repo.discussions
            .update(discussion_id, &title, content.as_deref())
            .await?,
    )
}

/// tomato.discussion.get_topic_discussions(topic_id, offset=0, limit=20) -> [discussion]
pub async fn get_topic_discussions(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["topic_id", "offset", "limit"])?;
    let topic_id: i64 = params.required(0, "topic_id")?;
    let page = params.page(1)?;
    reply(repo.discussions.list_for_topic(topic_id, page).await?)
}

/// tomato.discussion.get_user_published_discussions(user_id, offset=0, limit=20) -> [discussion]
pub async fn get_user_published_discussions(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    params.check(&["user_id", "offset", "limit"])?;
    let user_id: i64 = params.required(0, "user_id")?;
    let page = params.page(1)?;
    reply(repo.discussions.list_for_user(user_id, page).await?)
}
