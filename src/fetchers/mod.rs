/// Per-resource fetchers
///
/// Each fetcher pulls one marketplace collection, from the network or from
/// persisted storage, and applies the shared filter/sort rules where the
/// collection is client-side. Outer failures propagate; per-item failures
/// are contained where noted.

use crate::catalog::types::User;

// GET /templates/ with server-side filtering
pub mod templates;

// Published agents with the one-time author migration
pub mod agents;

// Agents saved to the user's repository
pub mod repository_agents;

// Template probing and workflow-of-workflows classification
pub mod workflows_of_workflows;

// One-time import of agents from official templates
pub mod seeding;

pub use agents::{fetch_agents, migrate_authors, Migration};
pub use repository_agents::fetch_repository_agents;
pub use seeding::{seed_official_agents, SeedOutcome};
pub use templates::fetch_templates;
pub use workflows_of_workflows::{classify_templates, fetch_workflows_of_workflows, ClassificationReport};

/// Filter, sort and identity parameters shared by every fetcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplaceQuery {
    pub category: String,
    pub search_query: String,
    pub sort_by: String,
    pub user: Option<User>,
}
