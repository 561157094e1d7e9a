//! Apollo enrichment service - diagnostic entry point
//!
//! Loads configuration, builds the rate-limited client, and prints the current
//! provider quota snapshot. Useful for verifying credentials and connectivity
//! before wiring the service into an application.

use anyhow::Result;
use apollo_enrichment::{ApolloClient, Config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging on stderr; RUST_LOG wins over LOG_LEVEL.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Apollo client configured: {} (rate limit {}/{}ms, timeout {}s)",
        config.api_base_url,
        config.rate_limit_max,
        config.rate_limit_window_ms,
        config.request_timeout_secs
    );

    let client = Arc::new(ApolloClient::new(&config));

    match client.get_api_usage().await {
        Ok(usage) => {
            println!(
                "Apollo API usage: used {} / quota {}, remaining {}",
                usage.used.map_or("?".to_string(), |v| v.to_string()),
                usage.quota.map_or("?".to_string(), |v| v.to_string()),
                usage.remaining.map_or("?".to_string(), |v| v.to_string()),
            );
            if let Some(resets_at) = usage.resets_at {
                println!("Quota resets at {}", resets_at);
            }
        }
        Err(e) => {
            error!("Failed to read API usage: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
