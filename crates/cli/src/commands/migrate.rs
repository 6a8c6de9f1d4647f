//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wr-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PROXY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/proxy/migrations/` and are embedded at build
//! time.

use wholesale_proxy::config::ToolConfig;
use wholesale_proxy::db;

use super::CommandError;

/// Run the proxy's database migrations.
pub async fn run() -> Result<(), CommandError> {
    let config = ToolConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../proxy/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
