//! Configuration module for the discussion service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Maximum number of pooled database connections
    pub db_max_connections: u32,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("DISCUSSION_DB_PATH")
            .unwrap_or_else(|_| "./data/discussion.sqlite".to_string())
            .into();

        let db_max_connections = env::var("DISCUSSION_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);

        let bind_addr = env::var("DISCUSSION_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid DISCUSSION_BIND_ADDR format");

        let log_level = env::var("DISCUSSION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = env::var("DISCUSSION_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogFormat::Text);

        Self {
            db_path,
            db_max_connections,
            bind_addr,
            log_level,
            log_format,
        }
    }
}
