/// Marketplace catalog layer
///
/// Types exchanged with the marketplace API, the pure filter/sort utilities
/// applied to every collection, and the workflow-of-workflows classifier.

// Core type definitions (Template, AgentTemplate, User, TabDraft)
pub mod types;

// Category/search filters and the composite sort comparator
pub mod filters;

// Multi-signal workflow-of-workflows heuristic
pub mod classifier;

pub use classifier::{classify, WorkflowDetail};
pub use filters::{apply_filters, sort_items, sort_listings, Listing};
pub use types::{AgentTemplate, TabDraft, Template, User};
