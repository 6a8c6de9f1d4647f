//! Wholesale CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! wr-cli migrate
//!
//! # Store an offline token for a shop (e.g., a custom app's token)
//! wr-cli session set --shop acme.myshopify.com --token shpat_...
//!
//! # Forget a shop
//! wr-cli session delete --shop acme.myshopify.com
//!
//! # Run one registration and print the outcome
//! wr-cli register --shop acme.myshopify.com --company-name Acme \
//!     --user-email jane@acme.test --company-email orders@acme.test
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::register::RegistrantArgs;

#[derive(Parser)]
#[command(name = "wr-cli")]
#[command(author, version, about = "Wholesale registration proxy tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage stored shop sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Run the registration workflow for one submission
    Register {
        /// Shop domain (e.g., acme.myshopify.com)
        #[arg(long)]
        shop: String,

        /// Log each workflow step as it is recorded
        #[arg(long)]
        events: bool,

        #[command(flatten)]
        registrant: RegistrantArgs,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Store or replace a shop's offline access token
    Set {
        /// Shop domain (e.g., acme.myshopify.com)
        #[arg(long)]
        shop: String,

        /// Admin API access token
        #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Granted scopes, comma separated
        #[arg(long, default_value = "read_customers,write_customers,read_companies,write_companies")]
        scope: String,
    },
    /// Remove a shop's session
    Delete {
        /// Shop domain (e.g., acme.myshopify.com)
        #[arg(long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wholesale_cli=info,wholesale_proxy=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Session { action } => match action {
            SessionAction::Set { shop, token, scope } => {
                commands::session::set(&shop, token, &scope).await?;
            }
            SessionAction::Delete { shop } => commands::session::delete(&shop).await?,
        },
        Commands::Register {
            shop,
            events,
            registrant,
        } => commands::register::run(&shop, registrant.into(), events).await?,
    }
    Ok(())
}
