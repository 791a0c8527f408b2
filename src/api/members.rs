//! Membership methods.

use serde_json::Value;

use super::{reply, Params};
use crate::db::Repository;
use crate::errors::AppError;

const PAIR: &[&str] = &["user_id", "topic_id"];

fn user_and_topic(params: &Params) -> Result<(i64, i64), AppError> {
    params.check(PAIR)?;
    Ok((params.required(0, "user_id")?, params.required(1, "topic_id")?))
}

/// tomato.discussion.add_member_to_topic(user_id, topic_id) -> membership
pub async fn add_member_to_topic(repo: &Repository, params: Params) -> Result<Value, AppError> {
    let (user_id, topic_id) = user_and_topic(&params)?;
    reply(repo.members.add(user_id, topic_id).await?)
}

/// tomato.discussion.remove_member_from_topic(user_id, topic_id) -> bool
pub async fn remove_member_from_topic(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    let (user_id, topic_id) = user_and_topic(&params)?;
    reply(repo.members.remove(user_id, topic_id).await?)
}

/// tomato.discussion.grant_topic_member_as_admin(user_id, topic_id) -> bool
pub async fn grant_topic_member_as_admin(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    let (user_id, topic_id) = user_and_topic(&params)?;
    reply(repo.members.grant_admin(user_id, topic_id).await?)
}

/// tomato.discussion.revoke_topic_member_as_admin(user_id, topic_id) -> bool
pub async fn revoke_topic_member_as_admin(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    let (user_id, topic_id) = user_and_topic(&params)?;
    reply(repo.members.revoke_admin(user_id, topic_id).await?)
}

/// tomato.discussion.get_topic_admin_members(topic_id) -> [membership]
pub async fn get_topic_admin_members(repo: &Repository, params: Params) -> Result<Value, AppError> {
    params.check(&["topic_id"])?;
    let topic_id: i64 = params.required(0, "topic_id")?;
    reply(repo.members.list_admins(topic_id).await?)
}

/// tomato.discussion.get_topic_non_admin_members(topic_id, offset=0, limit=20) -> [membership]
pub async fn get_topic_non_admin_members(
    repo: &Repository,
    params: Params,
) -> Result<Value, AppError> {
    params.check(&["topic_id", "offset", "limit"])?;
    let topic_id: i64 = params.required(0, "topic_id")?;
    let page = params.page(1)?;
    reply(repo.members.list_non_admins(topic_id, page).await?)
}
