//! Relay API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use relay_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Relay API Server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        address = %config.api.address(),
        legacy_tokens = config.jwt.accept_legacy,
        "Configuration loaded"
    );

    relay_api::run(config).await?;

    Ok(())
}
