/// Persisted marketplace state
///
/// Everything here sits on top of the `StorageAdapter` seam:
/// - `keys`: the storage keys of every persisted collection
/// - `agent_store`: load/save repository for agent collections
/// - `local_storage`: typed JSON handle with cross-context sync
/// - `drafts`: per-tab workflow builder drafts
/// - `deletion`: ownership checks and collection rewrites on delete

pub mod keys;

pub mod agent_store;

pub mod local_storage;

pub mod drafts;

pub mod deletion;

pub use agent_store::{AgentRepository, StorageAgentRepository};
pub use deletion::{delete_agents_from_storage, plan_agent_deletion, DeletionPlan, DeletionResult, DeletionVerdict};
pub use drafts::{DraftAction, DraftManager};
pub use local_storage::{get_local_storage_item, remove_local_storage_item, set_local_storage_item, LocalStorage};
