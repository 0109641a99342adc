/// Per-tab workflow builder drafts
///
/// Drafts are stored as one JSON object under `workflowBuilderDrafts`,
/// mapping tab id to [`TabDraft`]. The free functions read or rewrite that
/// object directly; [`DraftManager`] keeps an in-memory copy seeded once and
/// decides what a tab should show when it becomes active.

use crate::adapters::SharedStorage;
use crate::catalog::types::TabDraft;
use crate::persistence::keys;
use crate::persistence::local_storage::{get_local_storage_item, set_local_storage_item};
use serde_json::Value;
use std::collections::HashMap;

/// Tab id -> draft
pub type Drafts = HashMap<String, TabDraft>;

/// Name given to a tab reset to a blank workflow
pub const UNTITLED_WORKFLOW: &str = "Untitled Workflow";

/// Load every draft; `{}` when nothing usable is stored
///
/// Entries are decoded one by one so a single unreadable draft is skipped
/// without losing the others.
pub async fn load_drafts_from_storage(storage: Option<&SharedStorage>) -> Drafts {
    let Value::Object(stored) = get_local_storage_item(storage, keys::WORKFLOW_BUILDER_DRAFTS, Value::Null).await else {
        return Drafts::new();
    };

    stored
        .into_iter()
        .filter_map(|(tab_id, entry)| match serde_json::from_value::<TabDraft>(entry) {
            Ok(draft) => Some((tab_id, draft)),
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable draft for tab {}: {}", tab_id, e);
                None
            }
        })
        .collect()
}

/// Persist the whole draft map
pub async fn save_drafts_to_storage(storage: Option<&SharedStorage>, drafts: &Drafts) -> bool {
    set_local_storage_item(storage, keys::WORKFLOW_BUILDER_DRAFTS, drafts).await
}

pub async fn get_draft_for_tab(storage: Option<&SharedStorage>, tab_id: &str) -> Option<TabDraft> {
    load_drafts_from_storage(storage).await.remove(tab_id)
}

pub async fn save_draft_for_tab(storage: Option<&SharedStorage>, tab_id: &str, draft: TabDraft) -> bool {
    let mut drafts = load_drafts_from_storage(storage).await;
    drafts.insert(tab_id.to_string(), draft);
    save_drafts_to_storage(storage, &drafts).await
}

/// Remove one tab's draft; rewrites the map even if the tab had none
pub async fn delete_draft_for_tab(storage: Option<&SharedStorage>, tab_id: &str) -> bool {
    let mut drafts = load_drafts_from_storage(storage).await;
    drafts.remove(tab_id);
    save_drafts_to_storage(storage, &drafts).await
}

pub async fn clear_all_drafts(storage: Option<&SharedStorage>) -> bool {
    save_drafts_to_storage(storage, &Drafts::new()).await
}

pub async fn draft_exists(storage: Option<&SharedStorage>, tab_id: &str) -> bool {
    load_drafts_from_storage(storage).await.contains_key(tab_id)
}

/// What a tab should do with its editor state after a tab or workflow switch
#[derive(Debug, Clone, PartialEq)]
pub enum DraftAction {
    /// Agents are being added; leave the editor alone
    Skip,
    /// Replace the editor state with this draft
    Load(TabDraft),
    /// No workflow and no matching draft: show a blank workflow
    Reset(TabDraft),
    /// Keep whatever the editor currently shows
    Keep,
}

/// Blank editor state used by [`DraftAction::Reset`]
pub fn blank_draft() -> TabDraft {
    TabDraft {
        workflow_name: UNTITLED_WORKFLOW.to_string(),
        ..Default::default()
    }
}

/// In-memory draft map for the workflow builder, written through on save
pub struct DraftManager {
    storage: Option<SharedStorage>,
    drafts: Drafts,
}

impl DraftManager {
    /// Seed the in-memory map from storage
    pub async fn open(storage: Option<SharedStorage>) -> Self {
        let drafts = load_drafts_from_storage(storage.as_ref()).await;
        tracing::debug!("📝 Loaded {} workflow drafts", drafts.len());
        Self { storage, drafts }
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    /// Decide what the editor of `tab_id` should show
    ///
    /// A draft only loads when its workflow id equals `workflow_id`; two
    /// missing ids count as equal.
    pub fn on_tab_change(&self, tab_id: &str, workflow_id: Option<&str>, adding_agents: bool) -> DraftAction {
        if adding_agents {
            return DraftAction::Skip;
        }

        match self.drafts.get(tab_id) {
            Some(draft) if draft.workflow_id.as_deref() == workflow_id => DraftAction::Load(draft.clone()),
            _ if workflow_id.is_none() => DraftAction::Reset(blank_draft()),
            _ => DraftAction::Keep,
        }
    }

    /// Store the editor state of `tab_id` and persist every draft
    ///
    /// Each node is passed through `normalize(node, index, all_nodes)` first.
    pub async fn save_draft<F>(&mut self, tab_id: &str, snapshot: TabDraft, normalize: F) -> bool
    where
        F: Fn(&Value, usize, &[Value]) -> Value,
    {
        let nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| normalize(node, index, &snapshot.nodes))
            .collect();
        let draft = TabDraft { nodes, ..snapshot };

        self.drafts.insert(tab_id.to_string(), draft);
        save_drafts_to_storage(self.storage.as_ref(), &self.drafts).await
    }
}
