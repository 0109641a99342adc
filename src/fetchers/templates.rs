use crate::adapters::HttpClient;
use crate::catalog::types::Template;
use crate::fetchers::MarketplaceQuery;
use anyhow::Result;
use url::form_urlencoded;

/// `{api_base_url}/templates/?...` for `query`
///
/// `category` and `search` are only sent when non-empty; `sort_by` always is.
pub fn templates_url(api_base_url: &str, query: &MarketplaceQuery) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if !query.category.is_empty() {
        params.append_pair("category", &query.category);
    }
    if !query.search_query.is_empty() {
        params.append_pair("search", &query.search_query);
    }
    params.append_pair("sort_by", &query.sort_by);

    format!("{}/templates/?{}", api_base_url, params.finish())
}

/// Fetch the template list; the server applies filtering and ordering
pub async fn fetch_templates(http: &dyn HttpClient, api_base_url: &str, query: &MarketplaceQuery) -> Result<Vec<Template>> {
    let url = templates_url(api_base_url, query);
    let response = http.get(&url).await?;
    if !response.ok() {
        return Err(anyhow::anyhow!("Failed to fetch templates: HTTP {}", response.status));
    }

    let templates: Vec<Template> = response.json()?;
    tracing::debug!("📚 Fetched {} templates", templates.len());
    Ok(templates)
}
