/// Core marketplace type definitions
///
/// Defines the structures exchanged with the marketplace API and persisted in
/// local storage: templates, agent templates, workflow details and per-tab
/// editor drafts. Unknown fields are carried through untouched so that
/// rewriting a persisted collection never drops data written by other clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A workflow definition summary as returned by the template list endpoint
///
/// Immutable once fetched; every fetch replaces the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template identifier
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Free-form tags, order irrelevant for matching
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub estimated_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_official: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uses_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Creation timestamp, used as the publish date of seeded agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A publishable agent configuration
///
/// Lives in a persisted collection (`publishedAgents` or the repository
/// collection). A missing `author_id` marks the agent as unclaimed, which
/// makes it eligible for the author migration performed on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub estimated_time: String,
    /// Opaque agent configuration payload
    #[serde(default)]
    pub agent_config: Value,
    /// ISO-8601 publish timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_official: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentTemplate {
    /// True when no author has claimed this agent yet (absent or empty id)
    pub fn is_unclaimed(&self) -> bool {
        self.author_id.as_deref().map_or(true, str::is_empty)
    }
}

/// The signed-in marketplace user
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Display name recorded as author: username, else email, else none
    pub fn display_name(&self) -> Option<String> {
        non_empty(self.username.as_deref())
            .or_else(|| non_empty(self.email.as_deref()))
            .map(str::to_string)
    }
}

/// Persisted editor state of one workflow builder tab
///
/// Written on every relevant state change of the owning tab and read back
/// once when the tab or its workflow changes. Node and edge payloads belong to
/// the editor and are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Value>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_unsaved: bool,
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `Some(s)` only for non-empty strings, mirroring a truthiness check
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
