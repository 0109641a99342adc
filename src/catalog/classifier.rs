/// Workflow-of-workflows detection heuristic
///
/// A template is a workflow of workflows when its expanded node graph
/// references other workflows, or when the template itself describes or tags
/// itself as composite. Signals are kept as ordered tables of named predicates
/// so each one can be audited and tested on its own.
///
/// Node payloads come from several producers: some put `workflow_id`, `name`
/// and `description` on the node, others nest them under `data`. [`NodeView`]
/// hides that difference.

use crate::catalog::types::Template;
use serde_json::Value;

/// Substring every node-level text signal looks for
const WORKFLOW_MARKER: &str = "workflow";

/// Description phrases that mark a composite template
const COMPOSITE_PHRASES: [&str; 3] = ["workflow of workflows", "composite workflow", "nested workflow"];

/// Tag fragments that mark a composite template
const COMPOSITE_TAGS: [&str; 3] = ["workflow-of-workflows", "composite", "nested"];

/// Expanded node graph of one workflow, as returned by the "use" endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDetail {
    /// `None` when the body had no `nodes` or it was not an array
    pub nodes: Option<Vec<Value>>,
}

impl WorkflowDetail {
    pub fn from_value(mut body: Value) -> Self {
        let nodes = match body.get_mut("nodes").map(Value::take) {
            Some(Value::Array(nodes)) => Some(nodes),
            _ => None,
        };
        Self { nodes }
    }
}

/// Normalized read access to a node descriptor
///
/// Every accessor checks the node first and falls back to `node.data`,
/// skipping empty or falsy values the way a `||` chain would.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    node: &'a Value,
    data: Option<&'a Value>,
}

impl<'a> NodeView<'a> {
    pub fn new(node: &'a Value) -> Self {
        let data = node.get("data").filter(|data| data.is_object());
        Self { node, data }
    }

    /// First truthy value of `key` on the node, then on `data`
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        self.node
            .get(key)
            .filter(|value| is_truthy(value))
            .or_else(|| self.data.and_then(|data| data.get(key)).filter(|value| is_truthy(value)))
    }

    /// String field with the same fallback, `None` for non-strings
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Truthy value of `key` inside `data` only
    pub fn data_text(&self, key: &str) -> Option<&'a str> {
        self.data
            .and_then(|data| data.get(key))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn workflow_id(&self) -> Option<&'a Value> {
        self.field("workflow_id")
    }

    pub fn description(&self) -> String {
        self.text("description").unwrap_or_default().to_lowercase()
    }

    pub fn name(&self) -> String {
        self.text("name").unwrap_or_default().to_lowercase()
    }
}

/// JavaScript-style truthiness of a JSON value
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub type NodeSignal = fn(&NodeView<'_>, &Template) -> bool;
pub type TemplateSignal = fn(&Template) -> bool;

/// Node-level signals, evaluated in order for each node
pub const NODE_SIGNALS: [(&str, NodeSignal); 4] = [
    ("references_workflow_id", references_workflow_id),
    ("description_mentions_workflow", description_mentions_workflow),
    ("name_mentions_workflow", name_mentions_workflow),
    ("template_tag_mentions_workflow", template_tag_mentions_workflow),
];

/// Template-level signals
pub const TEMPLATE_SIGNALS: [(&str, TemplateSignal); 2] = [
    ("composite_description", composite_description),
    ("composite_tag", composite_tag),
];

fn references_workflow_id(node: &NodeView<'_>, _template: &Template) -> bool {
    node.workflow_id().is_some()
}

fn description_mentions_workflow(node: &NodeView<'_>, _template: &Template) -> bool {
    node.description().contains(WORKFLOW_MARKER)
}

fn name_mentions_workflow(node: &NodeView<'_>, _template: &Template) -> bool {
    node.name().contains(WORKFLOW_MARKER)
}

// Looks at the template, not the node: any node at all makes a
// "workflow"-tagged template positive.
fn template_tag_mentions_workflow(_node: &NodeView<'_>, template: &Template) -> bool {
    template
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(WORKFLOW_MARKER))
}

fn composite_description(template: &Template) -> bool {
    let description = template.description.to_lowercase();
    COMPOSITE_PHRASES
        .iter()
        .any(|phrase| description.contains(phrase))
}

fn composite_tag(template: &Template) -> bool {
    template.tags.iter().any(|tag| {
        let tag = tag.to_lowercase();
        COMPOSITE_TAGS.iter().any(|marker| tag.contains(marker))
    })
}

/// True if any node fires any node-level signal
pub fn has_workflow_reference(nodes: &[Value], template: &Template) -> bool {
    nodes.iter().any(|node| {
        let view = NodeView::new(node);
        NODE_SIGNALS.iter().any(|(_, signal)| signal(&view, template))
    })
}

/// True if the template describes or tags itself as composite
pub fn is_workflow_of_workflows(template: &Template) -> bool {
    TEMPLATE_SIGNALS.iter().any(|(_, signal)| signal(template))
}

/// Classify a template against its expanded node graph
///
/// A detail without a node array is never positive, whatever the template
/// says about itself.
pub fn classify(template: &Template, detail: &WorkflowDetail) -> bool {
    match detail.nodes.as_deref() {
        Some(nodes) => has_workflow_reference(nodes, template) || is_workflow_of_workflows(template),
        None => false,
    }
}

/// Names of every signal that fired, for diagnostics
pub fn matched_signals(template: &Template, detail: &WorkflowDetail) -> Vec<&'static str> {
    let Some(nodes) = detail.nodes.as_deref() else {
        return Vec::new();
    };

    let mut fired: Vec<&'static str> = NODE_SIGNALS
        .iter()
        .filter(|(_, signal)| {
            nodes
                .iter()
                .any(|node| signal(&NodeView::new(node), template))
        })
        .map(|(name, _)| *name)
        .collect();
    fired.extend(
        TEMPLATE_SIGNALS
            .iter()
            .filter(|(_, signal)| signal(template))
            .map(|(name, _)| *name),
    );
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::template;
    use serde_json::json;

    fn detail(nodes: Value) -> WorkflowDetail {
        WorkflowDetail::from_value(json!({ "nodes": nodes }))
    }

    #[test]
    fn template_description_alone_is_enough_with_empty_nodes() {
        let mut nested = template("t1", "Pipeline");
        nested.description = "A Nested Workflow that fans out".into();

        assert!(classify(&nested, &detail(json!([]))));
        assert_eq!(matched_signals(&nested, &detail(json!([]))), vec!["composite_description"]);
    }

    #[test]
    fn nested_data_workflow_id_is_followed() {
        let plain = template("t1", "Plain");
        let nodes = json!([{ "id": "n1", "data": { "workflow_id": "x" } }]);

        assert!(classify(&plain, &detail(nodes)));
    }

    #[test]
    fn node_text_falls_back_to_data_when_top_level_is_empty() {
        let plain = template("t1", "Plain");
        let by_description = json!([{ "description": "", "data": { "description": "Calls a WORKFLOW" } }]);
        let by_name = json!([{ "data": { "name": "Sub-Workflow runner" } }]);

        assert!(classify(&plain, &detail(by_description)));
        assert!(classify(&plain, &detail(by_name)));
    }

    #[test]
    fn missing_or_non_array_nodes_never_classify() {
        let mut composite = template("t1", "Composite");
        composite.tags = vec!["composite".into()];

        assert!(!classify(&composite, &WorkflowDetail::from_value(json!({}))));
        assert!(!classify(&composite, &WorkflowDetail::from_value(json!({ "nodes": "n1" }))));
        assert!(classify(&composite, &detail(json!([]))));
    }

    #[test]
    fn workflow_tag_needs_at_least_one_node() {
        let mut tagged = template("t1", "Tagged");
        tagged.tags = vec!["My-Workflow".into()];

        assert!(!classify(&tagged, &detail(json!([]))));
        assert!(classify(&tagged, &detail(json!([{ "id": "n1", "name": "step" }]))));
    }

    #[test]
    fn composite_tags_match_case_insensitively() {
        let mut tagged = template("t1", "Tagged");
        tagged.tags = vec!["Workflow-Of-Workflows".into()];
        assert!(is_workflow_of_workflows(&tagged));

        tagged.tags = vec!["NESTED-steps".into()];
        assert!(is_workflow_of_workflows(&tagged));

        tagged.tags = vec!["simple".into()];
        assert!(!is_workflow_of_workflows(&tagged));
    }

    #[test]
    fn plain_nodes_do_not_classify() {
        let plain = template("t1", "Plain");
        let nodes = json!([
            { "id": "n1", "name": "Fetch", "description": "download data", "workflow_id": null },
            { "id": "n2", "data": { "name": "Store", "workflow_id": "" } }
        ]);

        assert!(!classify(&plain, &detail(nodes)));
    }

    #[test]
    fn truthiness_follows_javascript_rules() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!(7)));
        assert!(is_truthy(&json!({})));
    }
}
