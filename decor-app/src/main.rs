//! # Decor Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Pick the checkout provider adapter
//! - Create the marketplace service
//! - Start the HTTP server

mod config;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use decor_checkout::{HostedCheckoutClient, SandboxCheckout};
use decor_hex::{MarketplaceService, inbound::HttpServer};
use decor_repo::{Repo, build_repo};
use decor_types::CheckoutProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,decor_app=debug,decor_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting marketplace server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let addr = format!("0.0.0.0:{}", config.port);

    match config.checkout {
        config::CheckoutConfig::Sandbox => {
            tracing::warn!("Checkout provider: in-process sandbox, payments are simulated");
            serve(repo, SandboxCheckout::new(), &addr).await
        }
        config::CheckoutConfig::Hosted {
            base_url,
            secret_key,
        } => {
            tracing::info!("Checkout provider: {}", base_url);
            serve(repo, HostedCheckoutClient::new(base_url, secret_key), &addr).await
        }
    }
}

async fn serve<P: CheckoutProvider>(repo: Repo, checkout: P, addr: &str) -> anyhow::Result<()> {
    let service = MarketplaceService::new(repo, checkout);
    HttpServer::new(service).run(addr).await
}
