/// Tab selection and routing to data sources

use std::fmt;

/// What the repository tab is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryView {
    Workflows,
    Agents,
}

/// Marketplace tab state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketplaceTab {
    Agents,
    Repository(RepositoryView),
    WorkflowsOfWorkflows,
}

/// Collection a tab loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Templates,
    Agents,
    RepositoryAgents,
    WorkflowsOfWorkflows,
}

impl MarketplaceTab {
    /// Parse the UI selectors
    ///
    /// Unknown tab values fall back to the agents tab; under "repository"
    /// anything but "workflows" shows repository agents.
    pub fn from_selectors(active_tab: &str, repository_sub_tab: &str) -> Self {
        match active_tab {
            "repository" if repository_sub_tab == "workflows" => Self::Repository(RepositoryView::Workflows),
            "repository" => Self::Repository(RepositoryView::Agents),
            "workflows-of-workflows" => Self::WorkflowsOfWorkflows,
            _ => Self::Agents,
        }
    }

    pub fn data_source(self) -> DataSource {
        match self {
            Self::Agents => DataSource::Agents,
            Self::Repository(RepositoryView::Workflows) => DataSource::Templates,
            Self::Repository(RepositoryView::Agents) => DataSource::RepositoryAgents,
            Self::WorkflowsOfWorkflows => DataSource::WorkflowsOfWorkflows,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Templates => "templates",
            Self::Agents => "agents",
            Self::RepositoryAgents => "repository agents",
            Self::WorkflowsOfWorkflows => "workflows of workflows",
        };
        f.write_str(name)
    }
}
