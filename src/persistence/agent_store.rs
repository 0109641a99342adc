/// Repository interface over persisted agent collections
///
/// Fetchers never touch the storage adapter directly for agents: they load
/// and save through [`AgentRepository`], which keeps the author migration a
/// pure transform and makes every write observable in tests.

use crate::adapters::SharedStorage;
use crate::catalog::types::AgentTemplate;
use crate::persistence::keys;
use anyhow::Result;
use async_trait::async_trait;

/// Load/save access to one persisted agent collection
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Current collection; empty when absent or unreadable
    async fn load(&self) -> Result<Vec<AgentTemplate>>;

    /// Replace the whole collection
    async fn save(&self, agents: &[AgentTemplate]) -> Result<()>;
}

/// [`AgentRepository`] backed by a storage adapter key
#[derive(Clone)]
pub struct StorageAgentRepository {
    storage: Option<SharedStorage>,
    key: String,
}

impl StorageAgentRepository {
    pub fn new(storage: Option<SharedStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Repository over the published marketplace collection
    pub fn published(storage: Option<SharedStorage>) -> Self {
        Self::new(storage, keys::PUBLISHED_AGENTS)
    }
}

#[async_trait]
impl AgentRepository for StorageAgentRepository {
    async fn load(&self) -> Result<Vec<AgentTemplate>> {
        let Some(storage) = &self.storage else {
            return Ok(Vec::new());
        };

        let raw = storage.get_item(&self.key).await?;
        match decode_agents(raw.as_deref()) {
            Ok(agents) => Ok(agents),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring unreadable '{}' collection: {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, agents: &[AgentTemplate]) -> Result<()> {
        let Some(storage) = &self.storage else {
            tracing::debug!("No storage available, skipping save of '{}'", self.key);
            return Ok(());
        };

        let encoded = serde_json::to_string(agents)
            .map_err(|e| anyhow::anyhow!("Failed to encode '{}' collection: {}", self.key, e))?;
        storage.set_item(&self.key, &encoded).await?;

        tracing::debug!("💾 Saved {} agents under '{}'", agents.len(), self.key);
        Ok(())
    }
}

/// Decode a raw persisted agent collection
///
/// A missing or empty value is an empty collection; anything else must be a
/// JSON array of agents.
pub fn decode_agents(raw: Option<&str>) -> Result<Vec<AgentTemplate>> {
    match raw {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Invalid agent collection JSON: {}", e)),
    }
}
