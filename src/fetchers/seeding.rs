/// One-time import of official agents
///
/// Official templates embed agent nodes. The first time the marketplace
/// runs against a store, every such node is turned into a published agent
/// so that official agents show up next to user-published ones. A flag in
/// storage makes the import run once.

use crate::adapters::{HttpClient, SharedStorage};
use crate::catalog::classifier::{NodeView, WorkflowDetail};
use crate::catalog::types::{non_empty, AgentTemplate, Template};
use crate::fetchers::workflows_of_workflows::probe_workflow;
use crate::persistence::local_storage::set_local_storage_item;
use crate::persistence::agent_store::decode_agents;
use crate::persistence::{keys, AgentRepository, StorageAgentRepository};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// What [`seed_official_agents`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// No store to seed into
    Skipped,
    /// The seeded flag was already set
    AlreadySeeded,
    /// The template list or the stored collection could not be read; the
    /// flag stays unset
    Failed,
    /// Number of agents added
    Seeded(usize),
}

/// Import agent nodes of official templates into the published collection
pub async fn seed_official_agents(
    storage: Option<&SharedStorage>,
    http: &dyn HttpClient,
    api_base_url: &str,
) -> Result<SeedOutcome> {
    let Some(storage) = storage else {
        return Ok(SeedOutcome::Skipped);
    };

    let seeded = storage.get_item(keys::OFFICIAL_AGENTS_SEEDED).await?;
    if seeded.is_some_and(|flag| !flag.is_empty()) {
        tracing::debug!("Official agents already seeded, skipping");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    tracing::info!("🌱 Seeding official agents...");
    let official = match fetch_official_templates(http, api_base_url).await {
        Ok(official) => official,
        Err(e) => {
            tracing::error!("Failed to seed official agents: {}", e);
            return Ok(SeedOutcome::Failed);
        }
    };

    let raw = storage.get_item(keys::PUBLISHED_AGENTS).await?;
    let mut agents = match decode_agents(raw.as_deref()) {
        Ok(agents) => agents,
        Err(e) => {
            tracing::error!("Failed to seed official agents: {}", e);
            return Ok(SeedOutcome::Failed);
        }
    };
    let existing: HashSet<String> = agents.iter().map(|agent| agent.id.clone()).collect();

    let mut added = Vec::new();
    for template in &official {
        let detail = match probe_workflow(http, api_base_url, &template.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                tracing::error!("Failed to fetch workflow {}", template.id);
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to fetch workflow {}: {}", template.id, e);
                continue;
            }
        };

        for agent in agents_from_template(template, &detail) {
            if existing.contains(&agent.id) {
                tracing::debug!("Agent {} already exists, skipping", agent.id);
                continue;
            }
            added.push(agent);
        }
    }

    let count = added.len();
    if count > 0 {
        agents.extend(added);
        StorageAgentRepository::published(Some(storage.clone())).save(&agents).await?;
        tracing::info!("✅ Seeded {} official agents ({} total)", count, agents.len());
    } else {
        tracing::debug!("No official agents to add");
    }

    set_local_storage_item(Some(storage), keys::OFFICIAL_AGENTS_SEEDED, "true").await;
    Ok(SeedOutcome::Seeded(count))
}

async fn fetch_official_templates(http: &dyn HttpClient, api_base_url: &str) -> Result<Vec<Template>> {
    let response = http
        .get(&format!("{}/templates/?sort_by=popular", api_base_url))
        .await?;
    if !response.ok() {
        return Err(anyhow::anyhow!("Failed to fetch templates: HTTP {}", response.status));
    }

    let templates: Vec<Template> = response.json()?;
    let official: Vec<Template> = templates.into_iter().filter(|t| t.is_official).collect();
    tracing::debug!("Official workflows found: {}", official.len());
    Ok(official)
}

/// Agent nodes of one template: `type == "agent"` and carrying a config
pub fn agents_from_template(template: &Template, detail: &WorkflowDetail) -> Vec<AgentTemplate> {
    let Some(nodes) = detail.nodes.as_deref() else {
        tracing::debug!("Workflow {} has no nodes array", template.name);
        return Vec::new();
    };

    nodes
        .iter()
        .map(NodeView::new)
        .filter(|node| node.text("type") == Some("agent") && node.field("agent_config").is_some())
        .map(|node| agent_from_node(template, &node))
        .collect()
}

fn agent_from_node(template: &Template, node: &NodeView<'_>) -> AgentTemplate {
    let node_id = node
        .field("id")
        .map(value_text)
        .unwrap_or_else(|| format!("node_{}", Utc::now().timestamp_millis()));

    let name = node
        .text("name")
        .or_else(|| node.data_text("label"))
        .unwrap_or("Agent")
        .to_string();
    let description = node
        .text("description")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Agent from {}", template.name));

    let mut tags = template.tags.clone();
    tags.push("official".to_string());
    tags.push(slug(&template.name));

    AgentTemplate {
        id: format!("official_{}_{}", template.id, node_id),
        label: name.clone(),
        name,
        description,
        category: or_default(&template.category, "automation"),
        tags,
        difficulty: or_default(&template.difficulty, "intermediate"),
        estimated_time: or_default(&template.estimated_time, "5 min"),
        agent_config: node
            .field("agent_config")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        published_at: Some(
            non_empty(template.created_at.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        ),
        author_id: non_empty(template.author_id.as_deref()).map(str::to_string),
        author_name: Some(non_empty(template.author_name.as_deref()).unwrap_or("System").to_string()),
        is_official: true,
        extra: Default::default(),
    }
}

fn or_default(value: &str, default: &str) -> String {
    let chosen = if value.is_empty() { default } else { value };
    chosen.to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Lower-case with every whitespace run replaced by one `-`
fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(ch);
            in_space = false;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStorage, StorageAdapter};
    use crate::testing::FakeHttpClient;
    use serde_json::json;
    use std::sync::Arc;

    const API: &str = "http://api.test/api";
    const LIST: &str = "http://api.test/api/templates/?sort_by=popular";

    fn memory() -> SharedStorage {
        Arc::new(MemoryStorage::new())
    }

    fn official_list() -> Value {
        json!([
            {
                "id": "t1",
                "name": "Support  Triage",
                "is_official": true,
                "tags": ["support"],
                "author_id": "staff-1",
                "created_at": "2024-02-01T00:00:00Z"
            },
            { "id": "t2", "name": "Community", "is_official": false }
        ])
    }

    #[test]
    fn slug_collapses_whitespace_runs() {
        assert_eq!(slug("Support  Triage Flow"), "support-triage-flow");
        assert_eq!(slug("Single"), "single");
    }

    #[test]
    fn only_configured_agent_nodes_become_agents() {
        let template = Template {
            id: "t1".into(),
            name: "Flow".into(),
            ..Default::default()
        };
        let detail = WorkflowDetail::from_value(json!({
            "nodes": [
                { "id": "n1", "type": "agent", "agent_config": { "model": "m" }, "name": "Classifier" },
                { "id": "n2", "data": { "type": "agent", "agent_config": { "model": "m" }, "label": "Labeled" } },
                { "id": "n3", "type": "agent" },
                { "id": "n4", "type": "http", "agent_config": {} }
            ]
        }));

        let agents = agents_from_template(&template, &detail);
        let summary: Vec<(&str, &str)> = agents.iter().map(|a| (a.id.as_str(), a.name.as_str())).collect();
        assert_eq!(
            summary,
            vec![("official_t1_n1", "Classifier"), ("official_t1_n2", "Labeled")]
        );
        assert_eq!(agents[0].description, "Agent from Flow");
        assert_eq!(agents[0].category, "automation");
        assert_eq!(agents[0].difficulty, "intermediate");
        assert_eq!(agents[0].estimated_time, "5 min");
        assert_eq!(agents[0].author_name.as_deref(), Some("System"));
        assert!(agents[0].is_official);
    }

    #[tokio::test]
    async fn seeds_once_from_official_templates() {
        let storage = memory();
        let http = FakeHttpClient::new().respond(LIST, 200, official_list()).respond(
            "http://api.test/api/templates/t1/use",
            200,
            json!({ "nodes": [{ "id": "n1", "type": "agent", "agent_config": { "model": "m" } }] }),
        );

        let outcome = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded(1));

        let agents = StorageAgentRepository::published(Some(storage.clone())).load().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, "official_t1_n1");
        assert_eq!(agents[0].tags, vec!["support", "official", "support-triage"]);
        assert_eq!(agents[0].author_id.as_deref(), Some("staff-1"));
        assert_eq!(agents[0].published_at.as_deref(), Some("2024-02-01T00:00:00Z"));

        let again = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(again, SeedOutcome::AlreadySeeded);
        assert_eq!(http.calls().len(), 2);
    }

    #[tokio::test]
    async fn existing_agents_are_not_duplicated() {
        let storage = memory();
        storage
            .set_item(keys::PUBLISHED_AGENTS, &json!([{ "id": "official_t1_n1", "name": "Kept" }]).to_string())
            .await
            .unwrap();
        let http = FakeHttpClient::new().respond(LIST, 200, official_list()).respond(
            "http://api.test/api/templates/t1/use",
            200,
            json!({ "nodes": [{ "id": "n1", "type": "agent", "agent_config": {} , "name": "x" }, { "id": "n2", "data": { "type": "agent", "agent_config": { "k": 1 } } }] }),
        );

        let outcome = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded(1));

        let agents = StorageAgentRepository::published(Some(storage)).load().await.unwrap();
        let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["official_t1_n1", "official_t1_n2"]);
        assert_eq!(agents[0].name, "Kept");
    }

    #[tokio::test]
    async fn failed_list_leaves_flag_unset() {
        let storage = memory();
        let http = FakeHttpClient::new().respond(LIST, 500, json!({ "detail": "boom" }));

        let outcome = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Failed);
        assert!(storage.get_item(keys::OFFICIAL_AGENTS_SEEDED).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_collection_is_left_alone() {
        let storage = memory();
        storage.set_item(keys::PUBLISHED_AGENTS, "[{oops").await.unwrap();
        let http = FakeHttpClient::new().respond(LIST, 200, official_list()).respond(
            "http://api.test/api/templates/t1/use",
            200,
            json!({ "nodes": [{ "id": "n1", "type": "agent", "agent_config": { "model": "m" } }] }),
        );

        let outcome = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Failed);
        assert_eq!(
            storage.get_item(keys::PUBLISHED_AGENTS).await.unwrap().as_deref(),
            Some("[{oops")
        );
        assert!(storage.get_item(keys::OFFICIAL_AGENTS_SEEDED).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_official_templates_marks_seeded() {
        let storage = memory();
        let http = FakeHttpClient::new().respond(LIST, 200, json!([{ "id": "t2", "is_official": false }]));

        let outcome = seed_official_agents(Some(&storage), &http, API).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded(0));
        assert!(storage.get_item(keys::OFFICIAL_AGENTS_SEEDED).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn without_storage_nothing_happens() {
        let http = FakeHttpClient::new();
        assert_eq!(seed_official_agents(None, &http, API).await.unwrap(), SeedOutcome::Skipped);
        assert!(http.calls().is_empty());
    }
}
