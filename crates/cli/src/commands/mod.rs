//! CLI subcommands.

pub mod migrate;
pub mod register;
pub mod session;

use thiserror::Error;
use wholesale_proxy::config::ConfigError;
use wholesale_proxy::db::RepositoryError;
use wholesale_proxy::registration::WorkflowError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registration failed: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Invalid shop domain: {0}")]
    InvalidShop(String),

    #[error("No session stored for {0}; install the app or run `wr-cli session set`")]
    NoSession(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
