//! Configuration loading from environment.

use std::env;

/// Which checkout provider adapter to wire in.
pub enum CheckoutConfig {
    /// In-process simulation; payments never leave the process
    Sandbox,
    /// Real hosted provider reached over HTTP
    Hosted {
        base_url: String,
        secret_key: String,
    },
}

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub checkout: CheckoutConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let checkout = match env::var("CHECKOUT_MODE").as_deref() {
            Ok("hosted") => CheckoutConfig::Hosted {
                base_url: env::var("CHECKOUT_BASE_URL").map_err(|_| {
                    anyhow::anyhow!("CHECKOUT_BASE_URL is required when CHECKOUT_MODE=hosted")
                })?,
                secret_key: env::var("CHECKOUT_SECRET_KEY").map_err(|_| {
                    anyhow::anyhow!("CHECKOUT_SECRET_KEY is required when CHECKOUT_MODE=hosted")
                })?,
            },
            _ => CheckoutConfig::Sandbox,
        };

        Ok(Self {
            port,
            database_url,
            checkout,
        })
    }
}
