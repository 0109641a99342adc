/// Marketplace aggregator
///
/// Holds the four marketplace collections and a single `loading` flag, and
/// routes the active tab to exactly one fetcher. State is published through
/// a `watch` channel so observers see every change, including each
/// `loading` transition.
///
/// Re-running is driven by [`Marketplace::apply`]: it fetches only when the
/// tab selectors, filters, sort key or user differ from the last applied
/// parameters. There is no in-flight cancellation; the fetch that settles
/// last wins. `loading` follows the fetches of the routed source only.

pub mod tabs;

use crate::adapters::{HttpClient, SharedStorage};
use crate::catalog::types::{AgentTemplate, Template, User};
use crate::config::ViewConfig;
use crate::fetchers::{self, MarketplaceQuery, SeedOutcome};
use crate::persistence::{keys, plan_agent_deletion, DeletionPlan, DeletionResult, StorageAgentRepository};
use anyhow::Result;
use arc_swap::ArcSwapOption;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

pub use tabs::{DataSource, MarketplaceTab, RepositoryView};

/// Everything the marketplace view renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketplaceState {
    pub templates: Vec<Template>,
    pub workflows_of_workflows: Vec<Template>,
    pub agents: Vec<AgentTemplate>,
    pub repository_agents: Vec<AgentTemplate>,
    pub loading: bool,
    /// Outstanding fetches per source
    #[serde(skip)]
    in_flight: HashMap<DataSource, usize>,
}

impl MarketplaceState {
    fn outstanding(&self, source: DataSource) -> bool {
        self.in_flight.get(&source).is_some_and(|count| *count > 0)
    }
}

/// Inputs whose change triggers a re-fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplaceParams {
    pub active_tab: String,
    pub repository_sub_tab: String,
    pub query: MarketplaceQuery,
}

impl MarketplaceParams {
    pub fn from_view(view: &ViewConfig) -> Self {
        Self {
            active_tab: view.active_tab.clone(),
            repository_sub_tab: view.repository_sub_tab.clone(),
            query: MarketplaceQuery {
                category: view.category.clone(),
                search_query: view.search_query.clone(),
                sort_by: view.sort_by.clone(),
                user: view.user.clone(),
            },
        }
    }

    pub fn tab(&self) -> MarketplaceTab {
        MarketplaceTab::from_selectors(&self.active_tab, &self.repository_sub_tab)
    }
}

/// Marketplace data aggregator
pub struct Marketplace {
    http: Arc<dyn HttpClient>,
    storage: Option<SharedStorage>,
    api_base_url: String,
    state: watch::Sender<MarketplaceState>,
    /// Last parameters passed to `apply`
    applied: ArcSwapOption<MarketplaceParams>,
}

impl Marketplace {
    pub fn new(http: Arc<dyn HttpClient>, storage: Option<SharedStorage>, api_base_url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(MarketplaceState::default());
        Self {
            http,
            storage,
            api_base_url: api_base_url.into(),
            state,
            applied: ArcSwapOption::empty(),
        }
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<MarketplaceState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> MarketplaceState {
        self.state.borrow().clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn set_templates(&self, templates: Vec<Template>) {
        self.state.send_modify(|state| state.templates = templates);
    }

    pub fn set_workflows_of_workflows(&self, templates: Vec<Template>) {
        self.state.send_modify(|state| state.workflows_of_workflows = templates);
    }

    pub fn set_agents(&self, agents: Vec<AgentTemplate>) {
        self.state.send_modify(|state| state.agents = agents);
    }

    pub fn set_repository_agents(&self, agents: Vec<AgentTemplate>) {
        self.state.send_modify(|state| state.repository_agents = agents);
    }

    /// Re-run the routed fetcher if `params` changed since the last call
    ///
    /// Returns whether a fetch ran. Failures are logged and leave the
    /// previous collections in place.
    pub async fn apply(&self, params: MarketplaceParams) -> bool {
        if self.applied.load().as_deref() == Some(&params) {
            return false;
        }

        let source = params.tab().data_source();
        let query = params.query.clone();
        self.applied.store(Some(Arc::new(params)));

        tracing::debug!("🔀 Routing to {} fetcher", source);
        if let Err(e) = self.fetch(source, &query).await {
            tracing::error!("Failed to fetch {}: {}", source, e);
        }
        true
    }

    /// Run one fetcher and store its result
    ///
    /// The fetch is counted against `source` while it runs, and `loading`
    /// is recomputed for the routed source on both edges.
    pub async fn fetch(&self, source: DataSource, query: &MarketplaceQuery) -> Result<()> {
        self.state.send_modify(|state| {
            *state.in_flight.entry(source).or_default() += 1;
            state.loading = self.routed_loading(state);
        });
        let result = self.load(source, query).await;
        self.state.send_modify(|state| {
            if let Some(count) = state.in_flight.get_mut(&source) {
                *count = count.saturating_sub(1);
            }
            state.loading = self.routed_loading(state);
        });
        result
    }

    /// Whether the source of the last applied tab has a fetch outstanding
    ///
    /// Before the first `apply` any outstanding fetch counts.
    fn routed_loading(&self, state: &MarketplaceState) -> bool {
        match self.applied.load().as_deref() {
            Some(params) => state.outstanding(params.tab().data_source()),
            None => state.in_flight.values().any(|count| *count > 0),
        }
    }

    pub async fn fetch_templates(&self, query: &MarketplaceQuery) -> Result<()> {
        self.fetch(DataSource::Templates, query).await
    }

    pub async fn fetch_agents(&self, query: &MarketplaceQuery) -> Result<()> {
        self.fetch(DataSource::Agents, query).await
    }

    pub async fn fetch_repository_agents(&self, query: &MarketplaceQuery) -> Result<()> {
        self.fetch(DataSource::RepositoryAgents, query).await
    }

    pub async fn fetch_workflows_of_workflows(&self, query: &MarketplaceQuery) -> Result<()> {
        self.fetch(DataSource::WorkflowsOfWorkflows, query).await
    }

    async fn load(&self, source: DataSource, query: &MarketplaceQuery) -> Result<()> {
        let http = self.http.as_ref();
        match source {
            DataSource::Templates => {
                let templates = fetchers::fetch_templates(http, &self.api_base_url, query).await?;
                self.set_templates(templates);
            }
            DataSource::Agents => {
                let repository = StorageAgentRepository::published(self.storage.clone());
                let agents = fetchers::fetch_agents(&repository, query).await?;
                self.set_agents(agents);
            }
            DataSource::RepositoryAgents => {
                let agents = fetchers::fetch_repository_agents(self.storage.as_ref(), query).await?;
                self.set_repository_agents(agents);
            }
            DataSource::WorkflowsOfWorkflows => {
                let templates = fetchers::fetch_workflows_of_workflows(http, &self.api_base_url, query).await?;
                self.set_workflows_of_workflows(templates);
            }
        }
        Ok(())
    }

    /// Seed official agents, reloading agents if the agents tab is showing
    pub async fn seed_official_agents(&self) -> Result<SeedOutcome> {
        let outcome = fetchers::seed_official_agents(self.storage.as_ref(), self.http.as_ref(), &self.api_base_url).await?;

        if matches!(outcome, SeedOutcome::Seeded(added) if added > 0) {
            if let Some(params) = self.applied.load_full() {
                if params.tab().data_source() == DataSource::Agents {
                    if let Err(e) = self.fetch_agents(&params.query).await {
                        tracing::error!("Failed to reload agents after seeding: {}", e);
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Check which selected marketplace agents `user` may delete
    pub fn plan_agent_deletion(&self, selected_ids: &HashSet<String>, user: Option<&User>) -> DeletionPlan {
        plan_agent_deletion(&self.state.borrow().agents, selected_ids, user)
    }

    /// Delete published agents and drop them from the current state
    pub async fn delete_agents(&self, ids: &HashSet<String>) -> DeletionResult {
        let result =
            crate::persistence::delete_agents_from_storage(self.storage.as_ref(), keys::PUBLISHED_AGENTS, ids, "agents")
                .await;
        if result.success {
            self.state
                .send_modify(|state| state.agents.retain(|agent| !ids.contains(&agent.id)));
        }
        result
    }

    /// Delete repository agents and drop them from the current state
    pub async fn delete_repository_agents(&self, ids: &HashSet<String>) -> DeletionResult {
        let result = crate::persistence::delete_agents_from_storage(
            self.storage.as_ref(),
            keys::REPOSITORY_AGENTS,
            ids,
            "repository agents",
        )
        .await;
        if result.success {
            self.state
                .send_modify(|state| state.repository_agents.retain(|agent| !ids.contains(&agent.id)));
        }
        result
    }
}
