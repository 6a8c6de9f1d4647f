//! One-off registration command.
//!
//! Runs the same workflow as `POST /proxy/register` with the shop's stored
//! session and prints the JSON outcome to stdout.

use clap::Args;
use wholesale_core::Registrant;
use wholesale_proxy::config::ToolConfig;
use wholesale_proxy::db::{self, ShopSessionRepository};
use wholesale_proxy::registration::Orchestrator;
use wholesale_proxy::shopify::AdminClient;

use super::CommandError;
use super::session::parse_shop;

/// Form fields, as flags.
#[derive(Debug, Default, Args)]
pub struct RegistrantArgs {
    #[arg(long)]
    pub company_name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Label for the company's location
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub tax_id: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company_email: Option<String>,
    #[arg(long)]
    pub user_email: Option<String>,
    #[arg(long)]
    pub address1: Option<String>,
    #[arg(long)]
    pub address2: Option<String>,
    /// Country code
    #[arg(long)]
    pub country: Option<String>,
    /// State or province code
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<RegistrantArgs> for Registrant {
    fn from(args: RegistrantArgs) -> Self {
        Self {
            company_name: non_blank(args.company_name),
            first_name: non_blank(args.first_name),
            last_name: non_blank(args.last_name),
            location: non_blank(args.location),
            tax_id: non_blank(args.tax_id),
            phone: non_blank(args.phone),
            company_email: non_blank(args.company_email),
            user_email: non_blank(args.user_email),
            address1: non_blank(args.address1),
            address2: non_blank(args.address2),
            country: non_blank(args.country),
            state: non_blank(args.state),
            city: non_blank(args.city),
            zip_code: non_blank(args.zip_code),
        }
    }
}

/// Register one submission against `shop`.
pub async fn run(shop: &str, registrant: Registrant, show_events: bool) -> Result<(), CommandError> {
    let shop = parse_shop(shop)?;
    let config = ToolConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    let session = ShopSessionRepository::new(&pool)
        .get_by_shop(shop.as_str())
        .await?
        .ok_or_else(|| CommandError::NoSession(shop.to_string()))?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let client = AdminClient::new(
        http,
        &session.shop,
        &config.api_version,
        session.access_token.clone(),
    );

    let outcome = Orchestrator::new(&client, &config.workflow)
        .register(&registrant)
        .await?;

    if show_events {
        for event in &outcome.events {
            tracing::info!(
                stage = %event.stage,
                step = event.step,
                outcome = ?event.outcome,
                detail = event.detail.as_deref(),
                "Workflow step"
            );
        }
    }

    let json = serde_json::to_string_pretty(&outcome)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_flags_become_none() {
        let registrant: Registrant = RegistrantArgs {
            company_name: Some("Acme".to_string()),
            address1: Some("   ".to_string()),
            ..RegistrantArgs::default()
        }
        .into();

        assert_eq!(registrant.company_name.as_deref(), Some("Acme"));
        assert_eq!(registrant.address1, None);
        assert!(!registrant.has_address());
    }
}
