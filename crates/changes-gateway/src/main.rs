//! Changes Gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p changes-gateway
//! ```
//!
//! Configuration is loaded from environment variables.
//!
//! The binary serves subscriptions only; nothing in it publishes changes.
//! Producers embed the library and broadcast through the registry.

use changes_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.gateway.address(),
        "Configuration loaded"
    );

    changes_gateway::run(config).await?;

    Ok(())
}
