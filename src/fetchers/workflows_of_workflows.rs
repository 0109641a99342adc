/// Workflows-of-workflows fetcher
///
/// Lists templates like the templates fetcher, then expands each one through
/// the "use" endpoint and keeps those the classifier accepts. Probes run one
/// at a time in list order so every failure is attributable to one template.

use crate::adapters::{json_headers, HttpClient};
use crate::catalog::classifier::{classify, matched_signals, WorkflowDetail};
use crate::catalog::types::Template;
use crate::fetchers::{templates::fetch_templates, MarketplaceQuery};
use anyhow::Result;
use serde_json::Value;

/// Outcome of probing and classifying a template list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationReport {
    /// Classified templates, in list order
    pub matched: Vec<Template>,
    /// Ids whose probe or body decode failed
    pub failed: Vec<String>,
}

/// `POST {api}/templates/{id}/use` and decode the expanded graph
///
/// `Ok(None)` for a non-2xx answer.
pub async fn probe_workflow(http: &dyn HttpClient, api_base_url: &str, template_id: &str) -> Result<Option<WorkflowDetail>> {
    let url = format!("{}/templates/{}/use", api_base_url, template_id);
    let response = http.post(&url, &Value::Object(Default::default()), &json_headers()).await?;
    if !response.ok() {
        tracing::debug!("Skipping workflow {}: HTTP {}", template_id, response.status);
        return Ok(None);
    }

    let body: Value = response.json()?;
    Ok(Some(WorkflowDetail::from_value(body)))
}

/// Probe and classify every template, containing per-template failures
pub async fn classify_templates(http: &dyn HttpClient, api_base_url: &str, templates: Vec<Template>) -> ClassificationReport {
    let mut report = ClassificationReport::default();

    for template in templates {
        let detail = match probe_workflow(http, api_base_url, &template.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("Failed to check workflow {}: {}", template.id, e);
                report.failed.push(template.id);
                continue;
            }
        };

        if classify(&template, &detail) {
            tracing::debug!(
                "🔗 {} is a workflow of workflows ({:?})",
                template.id,
                matched_signals(&template, &detail)
            );
            report.matched.push(template);
        }
    }

    report
}

/// Fetch templates and keep the workflows of workflows
///
/// The list fetch propagates its errors; probe failures are logged and
/// skipped.
pub async fn fetch_workflows_of_workflows(
    http: &dyn HttpClient,
    api_base_url: &str,
    query: &MarketplaceQuery,
) -> Result<Vec<Template>> {
    let templates = fetch_templates(http, api_base_url, query).await?;
    let total = templates.len();

    let report = classify_templates(http, api_base_url, templates).await;
    tracing::info!(
        "🧩 {} of {} templates are workflows of workflows ({} failed)",
        report.matched.len(),
        total,
        report.failed.len()
    );

    Ok(report.matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHttpClient;
    use serde_json::json;

    const API: &str = "http://api.test/api";
    const LIST: &str = "http://api.test/api/templates/?sort_by=popular";

    fn popular() -> MarketplaceQuery {
        MarketplaceQuery {
            sort_by: "popular".into(),
            ..Default::default()
        }
    }

    fn use_url(id: &str) -> String {
        format!("{}/templates/{}/use", API, id)
    }

    #[tokio::test]
    async fn one_failing_probe_does_not_hide_the_others() {
        let http = FakeHttpClient::new()
            .respond(
                LIST,
                200,
                json!([
                    { "id": "t1", "name": "First" },
                    { "id": "t2", "name": "Second" },
                    { "id": "t3", "name": "Third" }
                ]),
            )
            .respond(&use_url("t1"), 200, json!({ "nodes": [{ "workflow_id": "w-9" }] }))
            .fail(&use_url("t2"), "connection reset")
            .respond(&use_url("t3"), 200, json!({ "nodes": [{ "data": { "workflow_id": "w-7" } }] }));

        let templates = fetch_templates(&http, API, &popular()).await.unwrap();
        let report = classify_templates(&http, API, templates).await;

        let ids: Vec<&str> = report.matched.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert_eq!(report.failed, vec!["t2".to_string()]);
    }

    #[tokio::test]
    async fn probes_post_an_empty_json_object() {
        let http = FakeHttpClient::new()
            .respond(LIST, 200, json!([{ "id": "t1", "name": "First" }]))
            .respond(&use_url("t1"), 200, json!({ "nodes": [] }));

        let matched = fetch_workflows_of_workflows(&http, API, &popular()).await.unwrap();
        assert!(matched.is_empty());

        let use_call = &http.calls()[1];
        assert_eq!(use_call.method, "POST");
        assert_eq!(use_call.url, use_url("t1"));
        assert_eq!(use_call.body, Some(json!({})));
        assert_eq!(use_call.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    }

    #[tokio::test]
    async fn non_ok_and_undecodable_probes_are_skipped() {
        let http = FakeHttpClient::new()
            .respond(
                LIST,
                200,
                json!([
                    { "id": "t1", "name": "Gone", "tags": ["composite"] },
                    { "id": "t2", "name": "Garbled", "tags": ["composite"] },
                    { "id": "t3", "name": "Nested", "description": "A nested workflow" }
                ]),
            )
            .respond(&use_url("t1"), 404, json!({ "detail": "not found" }))
            .respond_raw(&use_url("t2"), 200, "<html>")
            .respond(&use_url("t3"), 200, json!({ "nodes": [] }));

        let templates = fetch_templates(&http, API, &popular()).await.unwrap();
        let report = classify_templates(&http, API, templates).await;

        let ids: Vec<&str> = report.matched.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t3"]);
        assert_eq!(report.failed, vec!["t2".to_string()]);
    }

    #[tokio::test]
    async fn list_failure_propagates() {
        let http = FakeHttpClient::new().fail(LIST, "dns failure");
        assert!(fetch_workflows_of_workflows(&http, API, &popular()).await.is_err());
    }
}
