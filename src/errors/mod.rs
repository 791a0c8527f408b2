//! Error handling module for the discussion service.
//!
//! Provides the crate error type with mapping to JSON-RPC error codes and error objects.

use serde::Serialize;

/// JSON-RPC error codes as constants to avoid magic numbers.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Implementation-defined server error range starts here
    pub const DATABASE_ERROR: i32 = -32000;
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Request body is not valid JSON
    Parse(String),
    /// Request is not a valid JSON-RPC request object
    InvalidRequest(String),
    /// No operation registered under the requested name
    MethodNotFound(String),
    /// Arguments missing or of the wrong type
    InvalidParams(String),
    /// Storage failure, including constraint violations the core does not handle
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            AppError::Parse(_) => codes::PARSE_ERROR,
            AppError::InvalidRequest(_) => codes::INVALID_REQUEST,
            AppError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            AppError::InvalidParams(_) => codes::INVALID_PARAMS,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Parse(msg) => msg.clone(),
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::MethodNotFound(msg) => msg.clone(),
            AppError::InvalidParams(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

impl From<&AppError> for ErrorObject {
    fn from(error: &AppError) -> Self {
        Self {
            code: error.code(),
            message: error.message(),
        }
    }
}
