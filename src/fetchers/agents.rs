/// Published agents fetcher
///
/// Agents published before author tracking existed have no `author_id`.
/// The first signed-in load claims them for the current user and writes the
/// collection back once; later loads find nothing to change and never write.

use crate::catalog::filters::{apply_filters, sort_listings};
use crate::catalog::types::{AgentTemplate, User};
use crate::fetchers::MarketplaceQuery;
use crate::persistence::AgentRepository;
use anyhow::Result;

/// Result of [`migrate_authors`]
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub items: Vec<AgentTemplate>,
    /// True when at least one item gained an author
    pub changed: bool,
}

/// Assign unclaimed agents to `user`
///
/// Needs a user with a non-empty id; an existing `author_id` is never
/// overwritten.
pub fn migrate_authors(items: Vec<AgentTemplate>, user: Option<&User>) -> Migration {
    let Some(user) = user.filter(|user| !user.id.is_empty()) else {
        return Migration { items, changed: false };
    };

    let author_name = user.display_name();
    let mut changed = false;
    let items = items
        .into_iter()
        .map(|mut agent| {
            if agent.is_unclaimed() {
                agent.author_id = Some(user.id.clone());
                agent.author_name = author_name.clone();
                changed = true;
            }
            agent
        })
        .collect();

    Migration { items, changed }
}

/// Load, migrate, filter and sort published agents
///
/// Officials first, then by date for "popular"/"recent" or by name
/// otherwise. A failed migration write is logged and the migrated list is
/// still returned.
pub async fn fetch_agents(repository: &dyn AgentRepository, query: &MarketplaceQuery) -> Result<Vec<AgentTemplate>> {
    let mut agents = repository.load().await?;

    if !agents.is_empty() {
        let migration = migrate_authors(agents, query.user.as_ref());
        if migration.changed {
            tracing::info!("👤 Assigned unclaimed agents to the current user");
            if let Err(e) = repository.save(&migration.items).await {
                tracing::error!("Failed to save migrated agents: {}", e);
            }
        }
        agents = migration.items;
    }

    let mut filtered = apply_filters(agents, &query.category, &query.search_query);
    sort_listings(&mut filtered, &query.sort_by, true);

    tracing::debug!("🤖 Loaded {} published agents", filtered.len());
    Ok(filtered)
}
