/// Marketplace data layer
///
/// Fetches, caches, filters, sorts and migrates the collections behind a
/// workflow/agent marketplace: templates, published and repository agents,
/// and composite workflows of workflows.

// Core configuration and setup
pub mod config;

// Collaborator seams - HTTP client and key-value storage
pub mod adapters;

// Marketplace types, filter/sort utilities and the workflow-of-workflows classifier
pub mod catalog;

// Per-resource fetchers, author migration and official agent seeding
pub mod fetchers;

// Persisted state - agent repository, typed local storage, drafts, deletion
pub mod persistence;

// Tab routing and the aggregated marketplace state
pub mod marketplace;

// Application wiring for the binary
pub mod app;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for external consumers
pub use adapters::{HttpClient, StorageAdapter};
pub use catalog::{AgentTemplate, Template, User};
pub use fetchers::MarketplaceQuery;
pub use marketplace::{Marketplace, MarketplaceParams, MarketplaceState, MarketplaceTab};
