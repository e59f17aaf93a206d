use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const NEWSAPI_API: &str = "https://newsapi.org/v2";

/// Headline search via NewsAPI.
pub struct NewsApiTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl NewsApiTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: NEWSAPI_API.to_string(),
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

    async fn fetch(&self, topics: &[String]) -> Result<String> {
        let query = topics.join(" OR ");
        let resp = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&[("q", query.as_str()), ("apiKey", self.api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            let msg = body["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!("NewsAPI request failed: {msg}");
        }

        let articles: Vec<Value> = body["articles"]
            .as_array()
            .unwrap_or(&Vec::new())
            .iter()
            .map(|a| {
                serde_json::json!({
                    "source": a["source"]["name"].as_str().unwrap_or(""),
                    "title": a["title"].as_str().unwrap_or(""),
                    "url": a["url"].as_str().unwrap_or(""),
                    "published_at": a["publishedAt"],
                })
            })
            .collect();

        Ok(serde_json::json!({ "articles": articles }).to_string())
    }
}

#[async_trait]
impl Tool for NewsApiTool {
    fn key(&self) -> &str {
        "news_search"
    }

    fn name(&self) -> &str {
        "News Search"
    }

    fn description(&self) -> &str {
        "Search recent news articles for one or more topics via NewsAPI."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topics": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Search topics, e.g. [\"tech\", \"earnings\"]"
                }
            },
            "required": ["topics"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let topics: Vec<String> = parsed["topics"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if topics.is_empty() {
            anyhow::bail!("news_search: 'topics' must be a non-empty array of strings");
        }
        self.fetch(&topics).await
    }
}
