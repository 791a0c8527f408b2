//! JSON-RPC API module.
//!
//! A single endpoint accepts JSON-RPC 2.0 requests (single or batch) and
//! dispatches them by method name to the entity managers.

mod comments;
mod discussions;
mod members;
mod params;
mod topics;

pub use params::Params;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::Repository;
use crate::errors::{AppError, ErrorObject};
use crate::AppState;

/// Namespace shared by every method name.
pub const METHOD_PREFIX: &str = "tomato.discussion.";

/// Incoming JSON-RPC request object.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// `None` when the member is missing (a notification), `Some(Null)` for an explicit null id
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Outgoing JSON-RPC response object.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: &AppError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(ErrorObject::from(error)),
            id,
        }
    }
}

/// POST /api - Handle a JSON-RPC request or batch.
pub async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            let err = AppError::Parse(format!("Parse error: {}", e));
            return Json(RpcResponse::failure(Value::Null, &err)).into_response();
        }
    };

    match payload {
        Value::Array(calls) if calls.is_empty() => {
            let err = AppError::InvalidRequest("Invalid request: empty batch".to_string());
            Json(RpcResponse::failure(Value::Null, &err)).into_response()
        }
        Value::Array(calls) => {
            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                if let Some(response) = handle_call(&state.repo, call).await {
                    responses.push(response);
                }
            }
            if responses.is_empty() {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(responses).into_response()
            }
        }
        call => match handle_call(&state.repo, call).await {
            Some(response) => Json(response).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
    }
}

/// Run one call. Returns `None` for notifications.
async fn handle_call(repo: &Repository, call: Value) -> Option<RpcResponse> {
    let request: RpcRequest = match serde_json::from_value(call) {
        Ok(request) => request,
        Err(e) => {
            let err = AppError::InvalidRequest(format!("Invalid request: {}", e));
            return Some(RpcResponse::failure(Value::Null, &err));
        }
    };

    if request.jsonrpc != "2.0" {
        let err = AppError::InvalidRequest(format!(
            "Invalid request: unsupported jsonrpc version {:?}",
            request.jsonrpc
        ));
        return Some(RpcResponse::failure(
            request.id.unwrap_or(Value::Null),
            &err,
        ));
    }

    tracing::debug!(method = %request.method, "RPC call");

    let outcome = match Params::new(request.params) {
        Ok(params) => dispatch(repo, &request.method, params).await,
        Err(e) => Err(e),
    };

    if let Err(ref e) = outcome {
        tracing::warn!(method = %request.method, code = e.code(), "RPC call failed: {}", e.message());
    }

    let id = request.id?;
    Some(match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => RpcResponse::failure(id, &e),
    })
}

/// Resolve a method name to its operation and run it.
pub async fn dispatch(repo: &Repository, method: &str, params: Params) -> Result<Value, AppError> {
    let name = method
        .strip_prefix(METHOD_PREFIX)
        .ok_or_else(|| method_not_found(method))?;

    match name {
        "add_topic" => topics::add_topic(repo, params).await,
        "get_topic" => topics::get_topic(repo, params).await,
        "add_member_to_topic" => members::add_member_to_topic(repo, params).await,
        "remove_member_from_topic" => members::remove_member_from_topic(repo, params).await,
        "grant_topic_member_as_admin" => members::grant_topic_member_as_admin(repo, params).await,
        "revoke_topic_member_as_admin" => members::revoke_topic_member_as_admin(repo, params).await,
        "get_topic_admin_members" => members::get_topic_admin_members(repo, params).await,
        "get_topic_non_admin_members" => members::get_topic_non_admin_members(repo, params).await,
        "add_topic_discussion" => discussions::add_topic_discussion(repo, params).await,
        "get_discussion" => discussions::get_discussion(repo, params).await,
        "delete_discussion" => discussions::delete_discussion(repo, params).await,
        "update_discussion" => discussions::update_discussion(repo, params).await,
        "get_topic_discussions" => discussions::get_topic_discussions(repo, params).await,
        "get_user_published_discussions" => {
            discussions::get_user_published_discussions(repo, params).await
        }
        "add_discussion_comment" => comments::add_discussion_comment(repo, params).await,
        "delete_discussion_comment" => comments::delete_discussion_comment(repo, params).await,
        "get_discussion_comments" => comments::get_discussion_comments(repo, params).await,
        _ => Err(method_not_found(method)),
    }
}

fn method_not_found(method: &str) -> AppError {
    AppError::MethodNotFound(format!("Method not found: {}", method))
}

/// Serialize an operation result into the `result` member.
fn reply<T: Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize result: {}", e)))
}
