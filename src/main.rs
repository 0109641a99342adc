/// Marketplace data layer command line entry point
///
/// Loads the marketplace view described by the MARKETPLACE_* environment
/// variables and prints the routed collection as JSON.

use marketplace_data::{app::run, config::Config};
use tracing_subscriber::EnvFilter;

/// Application entry point
///
/// Logging goes to stderr (filtered by RUST_LOG, default "info") so stdout
/// carries only the JSON result.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    // Load configuration (defaults to localhost:8000/api and ./data)
    let config = Config::default();

    let collection = run(config).await?;
    println!("{}", serde_json::to_string_pretty(&collection)?);

    Ok(())
}
