use crate::adapters::SharedStorage;
use crate::catalog::filters::{apply_filters, sort_listings};
use crate::catalog::types::AgentTemplate;
use crate::fetchers::MarketplaceQuery;
use crate::persistence::agent_store::decode_agents;
use crate::persistence::keys;
use anyhow::Result;

/// Load, filter and sort the agents saved to the user's repository
///
/// No author migration happens here. A missing store or an unreadable
/// collection yields an empty list; only a failing store read is an error.
pub async fn fetch_repository_agents(storage: Option<&SharedStorage>, query: &MarketplaceQuery) -> Result<Vec<AgentTemplate>> {
    let Some(storage) = storage else {
        return Ok(Vec::new());
    };

    let raw = storage.get_item(keys::REPOSITORY_AGENTS).await?;
    let agents = decode_agents(raw.as_deref()).unwrap_or_else(|e| {
        tracing::error!("Failed to load repository agents: {}", e);
        Vec::new()
    });

    let mut filtered = apply_filters(agents, &query.category, &query.search_query);
    sort_listings(&mut filtered, &query.sort_by, true);

    tracing::debug!("📦 Loaded {} repository agents", filtered.len());
    Ok(filtered)
}
