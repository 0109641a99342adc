/// Application setup and one-shot run
///
/// Wires together the storage backend, the HTTP client and the marketplace
/// aggregator, then loads the configured view once.

use crate::{
    adapters::{ReqwestHttpClient, SharedStorage, SqliteStorage},
    config::Config,
    marketplace::{DataSource, Marketplace, MarketplaceParams},
};
use anyhow::Result;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Create the marketplace aggregator with all collaborators
///
/// Opens (or creates) the SQLite key-value store in the data directory and
/// builds the reqwest client with the configured timeout.
pub async fn create_marketplace(config: &Config) -> Result<Marketplace> {
    let db_path = config.storage.database_path();
    tracing::info!("🗄️ Initializing key-value storage");
    let storage: SharedStorage = Arc::new(
        SqliteStorage::connect(&db_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open storage at {}: {}", db_path.display(), e))?,
    );

    tracing::info!("🌍 Initializing HTTP client for {}", config.api.base_url);
    let http = ReqwestHttpClient::new(Duration::from_secs(config.api.timeout_secs))?;

    Ok(Marketplace::new(Arc::new(http), Some(storage), config.api.base_url.clone()))
}

/// Load the configured view once and return the routed collection as JSON
pub async fn run(config: Config) -> Result<Value> {
    tracing::info!("Starting marketplace data run...");

    let marketplace = create_marketplace(&config).await?;

    if config.view.seed_official_agents {
        let outcome = marketplace.seed_official_agents().await?;
        tracing::info!("🌱 Official agent seeding: {:?}", outcome);
    }

    let params = MarketplaceParams::from_view(&config.view);
    let source = params.tab().data_source();
    marketplace.apply(params).await;

    let state = marketplace.state();
    let collection = match source {
        DataSource::Templates => serde_json::to_value(&state.templates)?,
        DataSource::Agents => serde_json::to_value(&state.agents)?,
        DataSource::RepositoryAgents => serde_json::to_value(&state.repository_agents)?,
        DataSource::WorkflowsOfWorkflows => serde_json::to_value(&state.workflows_of_workflows)?,
    };

    tracing::info!("✅ Loaded {}", source);
    Ok(collection)
}
