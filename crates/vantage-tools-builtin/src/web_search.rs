use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const BRAVE_API: &str = "https://api.search.brave.com/res/v1/web/search";

/// General web search via the Brave Search API. Results carry no structure
/// the three normalization envelopes model, so they're returned as-is; the
/// normalize/wire-min decorators pass this tool's output through untouched.
pub struct WebSearchTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WebSearchTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: BRAVE_API.to_string(),
            client: Client::new(),
        }
    }

    #[cfg(test)]
    fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: Client::new(),
        }
    }

    async fn search(&self, query: &str, count: usize) -> Result<String> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("count", &count.to_string())])
            .header("X-Subscription-Token", &self.api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            anyhow::bail!("Brave Search request failed with status {status}");
        }

        let results: Vec<Value> = body["web"]["results"]
            .as_array()
            .unwrap_or(&Vec::new())
            .iter()
            .take(count)
            .map(|r| {
                serde_json::json!({
                    "title": r["title"].as_str().unwrap_or(""),
                    "url": r["url"].as_str().unwrap_or(""),
                    "snippet": r["description"].as_str().unwrap_or(""),
                })
            })
            .collect();

        Ok(serde_json::json!({ "query": query, "results": results }).to_string())
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn key(&self) -> &str {
        "web_search"
    }

    fn name(&self) -> &str {
        "Web Search"
    }

    fn description(&self) -> &str {
        "Search the web. Returns titles, URLs, and snippets."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "count": {
                    "type": "integer",
                    "default": 5,
                    "description": "Maximum number of results"
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let query = parsed["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("web_search: 'query' is required"))?;
        let count = parsed["count"].as_u64().unwrap_or(5) as usize;
        self.search(query, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_trimmed_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "web": {
                    "results": [
                        {"title": "A", "url": "https://a.example", "description": "snippet a"},
                        {"title": "B", "url": "https://b.example", "description": "snippet b"},
                    ]
                }
            })))
            .mount(&server)
            .await;

        let tool = WebSearchTool::with_base_url("test_key".to_string(), server.uri());
        let result = tool
            .run(&test_context(), r#"{"query":"rust async","count":1}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["results"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["results"][0]["title"], "A");
    }

    #[tokio::test]
    async fn missing_query_is_an_error() {
        let tool = WebSearchTool::with_base_url("test_key".to_string(), "http://localhost".to_string());
        assert!(tool.run(&test_context(), "{}").await.is_err());
    }
}
