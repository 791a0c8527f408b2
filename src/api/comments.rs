//! Comment methods.

use serde_json::Value;

use super::{reply, Params};
use crate::db::Repository;
use crate::errors::AppError;

/// tomato.discussion.add_discussion_comment(discussion_id, user_id, content) -> comment
pub async fn add_discussion_comment(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["discussion_id", "user_id", "content"])?;
    let discussion_id: i64 = params.required(0, "discussion_id")?;
    let user_id: i64 = params.required(1, "user_id")?;
    let content: Option<String> = params.optional(2, "content")?;
    reply(
        repo.comments
            .add(discussion_id, user_id, content.as_deref())
            .await?,
    )
}

/// tomato.discussion.delete_discussion_comment(discussion_comment_id) -> bool
pub async fn delete_discussion_comment(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    params.check(&["discussion_comment_id"])?;
    let comment_id: i64 = params.required(0, "discussion_comment_id")?;
    reply(repo.comments.delete(comment_id).await?)
}

/// tomato.discussion.get_discussion_comments(discussion_id, offset=0, limit=20) -> [comment]
pub async fn get_discussion_comments(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["discussion_id", "offset", "limit"])?;
    let discussion_id: i64 = params.required(0, "discussion_id")?;
    let page = params.page(1)?;
    reply(repo.comments.list_for_discussion(discussion_id, page).await?)
}
