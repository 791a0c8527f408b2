//! Tomato Discussion Backend
//!
//! A JSON-RPC service for topics, memberships, discussions and comments with SQLite persistence.

mod api;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

#[derive(Parser, Debug)]
#[command(name = "tomato-discussion")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the JSON-RPC server
    Serve,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        action: DbCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Create the schema and exit
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_env();

    init_logging(&config);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Db {
            action: DbCommand::Init,
        } => {
            let pool = db::init_database(&config.db_path, config.db_max_connections).await?;
            pool.close().await;
            tracing::info!("Database initialized at {:?}", config.db_path);
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Tomato Discussion Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path, config.db_max_connections).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState { repo };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", post(api::handle_rpc))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
