// Storage keys shared by every persisted marketplace collection

/// Published marketplace agents
pub const PUBLISHED_AGENTS: &str = "publishedAgents";

/// Agents saved to the user's own repository
pub const REPOSITORY_AGENTS: &str = "repositoryAgents";

/// Map of tab id -> editor draft
pub const WORKFLOW_BUILDER_DRAFTS: &str = "workflowBuilderDrafts";

/// One-time flag set once official agents were seeded
pub const OFFICIAL_AGENTS_SEEDED: &str = "officialAgentsSeeded";
