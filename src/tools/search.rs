use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::settings::SearchSettings;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A live web-search capability.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Provider name shown in citations (e.g. "DuckDuckGo").
    fn provider_name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError>;
}

pub struct WebSearchClient {
    settings: SearchSettings,
    client: Client,
}

impl WebSearchClient {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    async fn dispatch(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        match self.settings.provider.as_str() {
            "brave" => {
                if let Some(api_key) = self.settings.brave_api_key.as_deref() {
                    return self.brave_search(query, api_key).await;
                }
            }
            "bing" => {
                if let Some(api_key) = self.settings.bing_api_key.as_deref() {
                    return self.bing_search(query, api_key).await;
                }
            }
            "google" => {
                if let (Some(api_key), Some(engine_id)) = (
                    self.settings.google_api_key.as_deref(),
                    self.settings.google_engine_id.as_deref(),
                ) {
                    match self.google_search(query, api_key, engine_id).await {
                        Ok(results) if !results.is_empty() => return Ok(results),
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!("Google search failed, using DuckDuckGo: {}", err)
                        }
                    }
                }
            }
            _ => {}
        }

        self.duckduckgo_search(query).await
    }

    async fn google_search(
        &self,
        query: &str,
        api_key: &str,
        engine_id: &str,
    ) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
            api_key,
            engine_id,
            urlencoding::encode(query)
        );

        let payload = self.get_json(self.client.get(url), "Google").await?;
        let items = payload
            .get("items")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(collect_results(items, "title", "link", "snippet"))
    }

    async fn duckduckgo_search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let payload = self.get_json(self.client.get(url), "DuckDuckGo").await?;
        Ok(parse_duckduckgo(&payload))
    }

    async fn brave_search(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}",
            urlencoding::encode(query)
        );

        let request = self
            .client
            .get(url)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json");
        let payload = self.get_json(request, "Brave").await?;
        let items = payload
            .get("web")
            .and_then(|w| w.get("results"))
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(collect_results(items, "title", "url", "description"))
    }

    async fn bing_search(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.bing.microsoft.com/v7.0/search?q={}",
            urlencoding::encode(query)
        );

        let request = self
            .client
            .get(url)
            .header("Ocp-Apim-Subscription-Key", api_key);
        let payload = self.get_json(request, "Bing").await?;
        let items = payload
            .get("webPages")
            .and_then(|wp| wp.get("value"))
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(collect_results(items, "name", "url", "snippet"))
    }

    async fn get_json(
        &self,
        request: reqwest::RequestBuilder,
        provider: &str,
    ) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(ApiError::upstream)?;

        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "{} search failed: {}",
                provider,
                response.status()
            )));
        }

        response.json().await.map_err(ApiError::upstream)
    }
}

#[async_trait]
impl WebSearch for WebSearchClient {
    fn provider_name(&self) -> &str {
        match self.settings.provider.as_str() {
            "brave" if self.settings.brave_api_key.is_some() => "Brave",
            "bing" if self.settings.bing_api_key.is_some() => "Bing",
            "google"
                if self.settings.google_api_key.is_some()
                    && self.settings.google_engine_id.is_some() =>
            {
                "Google"
            }
            _ => "DuckDuckGo",
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let mut results = self.dispatch(query).await?;
        results.truncate(self.settings.max_results.max(1));
        Ok(results)
    }
}

fn collect_results(items: &[Value], title_key: &str, url_key: &str, snippet_key: &str) -> Vec<SearchResult> {
    items
        .iter()
        .filter_map(|item| {
            let title = item.get(title_key).and_then(|v| v.as_str()).unwrap_or("");
            let url = item.get(url_key).and_then(|v| v.as_str()).unwrap_or("");
            let snippet = item.get(snippet_key).and_then(|v| v.as_str()).unwrap_or("");
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(SearchResult {
                title: title.to_string(),
                url: url.to_string(),
                snippet: snippet.to_string(),
            })
        })
        .collect()
}

fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(abstract_text) = payload.get("AbstractText").and_then(|v| v.as_str()) {
        if let Some(url) = payload.get("AbstractURL").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() && !url.is_empty() {
                results.push(SearchResult {
                    title: abstract_text
                        .split(" - ")
                        .next()
                        .unwrap_or(abstract_text)
                        .to_string(),
                    url: url.to_string(),
                    snippet: abstract_text.to_string(),
                });
            }
        }
    }

    if let Some(items) = payload.get("Results").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }
    if let Some(items) = payload.get("RelatedTopics").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }

    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = item.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: text.split(" - ").next().unwrap_or(text).to_string(),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_duckduckgo_flattens_abstract_and_nested_topics() {
        let payload = json!({
            "AbstractText": "Digital Personal Data Protection Act - Indian law on personal data",
            "AbstractURL": "https://en.wikipedia.org/wiki/DPDPA",
            "Results": [],
            "RelatedTopics": [
                { "Text": "MeitY - ministry notice", "FirstURL": "https://meity.gov.in/dpdp" },
                { "Name": "Rules", "Topics": [
                    { "Text": "Draft DPDP Rules 2025", "FirstURL": "https://example.org/rules" },
                    { "Text": "", "FirstURL": "https://example.org/empty" }
                ]}
            ]
        });

        let results = parse_duckduckgo(&payload);

        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://en.wikipedia.org/wiki/DPDPA",
                "https://meity.gov.in/dpdp",
                "https://example.org/rules"
            ]
        );
        assert_eq!(results[0].title, "Digital Personal Data Protection Act");
        assert_eq!(results[1].title, "MeitY");
    }

    #[test]
    fn collect_results_requires_title_and_url() {
        let items = vec![
            json!({ "name": "Bing hit", "url": "https://bing.example/1", "snippet": "s" }),
            json!({ "name": "", "url": "https://bing.example/2" }),
            json!({ "name": "No url" }),
        ];
        let results = collect_results(&items, "name", "url", "snippet");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Bing hit");
        assert_eq!(results[0].snippet, "s");
    }

    #[test]
    fn provider_name_falls_back_to_duckduckgo_without_keys() {
        let client = WebSearchClient::new(SearchSettings {
            provider: "brave".to_string(),
            max_results: 5,
            ..SearchSettings::default()
        });
        assert_eq!(client.provider_name(), "DuckDuckGo");

        let client = WebSearchClient::new(SearchSettings {
            provider: "brave".to_string(),
            max_results: 5,
            brave_api_key: Some("key".to_string()),
            ..SearchSettings::default()
        });
        assert_eq!(client.provider_name(), "Brave");
    }
}
