/// Configuration management for the marketplace data layer
///
/// Handles the API endpoint, local persistence location, and the default
/// marketplace view (tab, filters, signed-in user) used by the binary.

use crate::catalog::types::User;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Marketplace API configuration
    pub api: ApiConfig,
    /// Local key-value persistence configuration
    pub storage: StorageConfig,
    /// Marketplace view selection and filters
    pub view: ViewConfig,
}

/// Remote marketplace API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash (e.g., "http://localhost:8000/api")
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub timeout_secs: u64,
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the key-value database (default: "data")
    /// Creates: {data_dir}/marketplace.db
    pub data_dir: String,
}

/// Marketplace view selection, mirrors what a UI would pass to the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Active tab selector ("agents", "repository", "workflows-of-workflows")
    pub active_tab: String,
    /// Repository sub tab selector ("workflows" or "agents")
    pub repository_sub_tab: String,
    pub category: String,
    pub search_query: String,
    pub sort_by: String,
    /// Signed-in user, only present when MARKETPLACE_USER_ID is set
    pub user: Option<User>,
    /// Seed official agents from official workflows before fetching
    pub seed_official_agents: bool,
}

impl StorageConfig {
    /// Path of the SQLite key-value database inside the data directory
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("marketplace.db")
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR overrides for scripted runs
    fn default() -> Self {
        let user = std::env::var("MARKETPLACE_USER_ID")
            .ok()
            .filter(|id| !id.is_empty())
            .map(|id| User {
                id,
                username: std::env::var("MARKETPLACE_USERNAME").ok(),
                email: std::env::var("MARKETPLACE_EMAIL").ok(),
            });

        Self {
            api: ApiConfig {
                base_url: std::env::var("MARKETPLACE_API_BASE")
                    .unwrap_or_else(|_| "http://localhost:8000/api".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout_secs: std::env::var("MARKETPLACE_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            storage: StorageConfig {
                data_dir: std::env::var("MARKETPLACE_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            view: ViewConfig {
                active_tab: std::env::var("MARKETPLACE_TAB")
                    .unwrap_or_else(|_| "agents".to_string()),
                repository_sub_tab: std::env::var("MARKETPLACE_SUB_TAB")
                    .unwrap_or_else(|_| "workflows".to_string()),
                category: std::env::var("MARKETPLACE_CATEGORY").unwrap_or_default(),
                search_query: std::env::var("MARKETPLACE_SEARCH").unwrap_or_default(),
                sort_by: std::env::var("MARKETPLACE_SORT")
                    .unwrap_or_else(|_| "popular".to_string()),
                user,
                seed_official_agents: std::env::var("MARKETPLACE_SEED_OFFICIAL")
                    .map(|v| v != "false" && v != "0")
                    .unwrap_or(true),
            },
        }
    }
}
