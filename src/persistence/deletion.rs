/// Ownership-aware agent deletion
///
/// Deleting is two steps: [`plan_agent_deletion`] decides which of the
/// selected agents the user may delete and what to tell them, and
/// [`delete_agents_from_storage`] rewrites a persisted collection without
/// the chosen ids. Official agents can never be deleted.

use crate::adapters::SharedStorage;
use crate::catalog::types::{AgentTemplate, User};
use serde_json::Value;
use std::collections::HashSet;

/// Outcome of checking a selection against the current user
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionVerdict {
    NothingSelected,
    /// Every selected agent is official
    OnlyOfficial,
    /// Nothing deletable belongs to the user
    Denied(String),
    /// The user owns some of the deletable agents
    Partial { owned: Vec<String>, selectable: usize },
    /// The user owns every deletable agent
    All { owned: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionPlan {
    /// Set when official agents were part of the selection
    pub official_notice: Option<String>,
    pub verdict: DeletionVerdict,
}

impl DeletionPlan {
    /// Ids that may be deleted once the user confirms
    pub fn owned_ids(&self) -> HashSet<String> {
        match &self.verdict {
            DeletionVerdict::Partial { owned, .. } | DeletionVerdict::All { owned } => owned.iter().cloned().collect(),
            _ => HashSet::new(),
        }
    }

    /// Confirmation prompt for plans that can proceed
    pub fn confirmation(&self) -> Option<String> {
        match &self.verdict {
            DeletionVerdict::Partial { owned, selectable } => Some(format!(
                "You can only delete {} of {} selected agent(s). Delete only the ones you own?",
                owned.len(),
                selectable
            )),
            DeletionVerdict::All { owned } => Some(format!(
                "Are you sure you want to delete {} selected agent(s) from the marketplace?",
                owned.len()
            )),
            _ => None,
        }
    }
}

/// Check which of the selected agents `user` may delete
pub fn plan_agent_deletion(agents: &[AgentTemplate], selected_ids: &HashSet<String>, user: Option<&User>) -> DeletionPlan {
    if selected_ids.is_empty() {
        return DeletionPlan {
            official_notice: None,
            verdict: DeletionVerdict::NothingSelected,
        };
    }

    let (official, deletable): (Vec<&AgentTemplate>, Vec<&AgentTemplate>) = agents
        .iter()
        .filter(|agent| selected_ids.contains(&agent.id))
        .partition(|agent| agent.is_official);

    let has_official = !official.is_empty();
    let official_notice = has_official.then(|| {
        format!(
            "Cannot delete {} official agent(s). Official agents cannot be deleted.",
            official.len()
        )
    });

    if has_official && deletable.is_empty() {
        return DeletionPlan {
            official_notice,
            verdict: DeletionVerdict::OnlyOfficial,
        };
    }

    let user_id = user.map(|user| user.id.as_str()).filter(|id| !id.is_empty());
    let owned: Vec<String> = deletable
        .iter()
        .filter(|agent| user_id.is_some() && agent.author_id.as_deref() == user_id)
        .map(|agent| agent.id.clone())
        .collect();

    tracing::debug!(
        "Delete agents check: {} deletable, {} owned by {:?}",
        deletable.len(),
        owned.len(),
        user_id
    );

    let verdict = if owned.is_empty() {
        DeletionVerdict::Denied(denial_message(&deletable, has_official))
    } else if owned.len() < deletable.len() {
        DeletionVerdict::Partial {
            owned,
            selectable: deletable.len(),
        }
    } else {
        DeletionVerdict::All { owned }
    };

    DeletionPlan { official_notice, verdict }
}

fn denial_message(deletable: &[&AgentTemplate], has_official: bool) -> String {
    let with_author = deletable.iter().filter(|agent| !agent.is_unclaimed()).count();

    if with_author == 0 {
        let reason = if has_official {
            "published before author tracking was added or are official"
        } else {
            "published before author tracking was added"
        };
        return format!("Selected agents were {}. Please republish them to enable deletion.", reason);
    }

    let scope = if has_official {
        "You can only delete agents that you published (official agents cannot be deleted)."
    } else {
        "You can only delete agents that you published."
    };
    format!(
        "{} {} selected, {} have author info, but none match your user ID.",
        scope,
        deletable.len(),
        with_author
    )
}

/// Result of rewriting a stored agent collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionResult {
    pub success: bool,
    pub deleted_count: usize,
    pub error: Option<String>,
}

impl DeletionResult {
    fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("❌ {}", message);
        Self {
            success: false,
            deleted_count: 0,
            error: Some(message),
        }
    }
}

/// Rewrite the collection stored under `key` without `ids`
///
/// `label` names the collection in error messages ("agents",
/// "repository agents"). Entries are kept as raw JSON so fields this crate
/// does not model survive the rewrite.
pub async fn delete_agents_from_storage(
    storage: Option<&SharedStorage>,
    key: &str,
    ids: &HashSet<String>,
    label: &str,
) -> DeletionResult {
    let Some(storage) = storage else {
        return DeletionResult::failed("Storage not available");
    };

    let raw = match storage.get_item(key).await {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return DeletionResult::failed("No agents found in storage"),
        Err(e) => return DeletionResult::failed(format!("Failed to delete {}: {}", label, e)),
    };

    let stored: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(stored) => stored,
        Err(e) => return DeletionResult::failed(format!("Failed to delete {}: {}", label, e)),
    };

    let before = stored.len();
    let remaining: Vec<Value> = stored
        .into_iter()
        .filter(|agent| {
            agent
                .get("id")
                .and_then(Value::as_str)
                .map_or(true, |id| !ids.contains(id))
        })
        .collect();
    let deleted_count = before - remaining.len();

    let encoded = match serde_json::to_string(&remaining) {
        Ok(encoded) => encoded,
        Err(e) => return DeletionResult::failed(format!("Failed to delete {}: {}", label, e)),
    };
    if let Err(e) = storage.set_item(key, &encoded).await {
        tracing::error!("Failed to write '{}': {}", key, e);
        return DeletionResult::failed("Failed to save to storage");
    }

    tracing::info!("🗑️ Successfully deleted {} agent(s)", deleted_count);
    DeletionResult {
        success: true,
        deleted_count,
        error: None,
    }
}
