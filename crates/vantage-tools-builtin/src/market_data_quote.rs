use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const FMP_API: &str = "https://financialmodelingprep.com/api/v3";

/// Real-time quote snapshots from Financial Modeling Prep.
pub struct FmpQuoteTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl FmpQuoteTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: FMP_API.to_string(),
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

    async fn fetch(&self, tickers: &[String]) -> Result<String> {
        let symbols = tickers.join(",");
        let resp = self
            .client
            .get(format!("{}/quote/{}", self.base_url, symbols))
            .query(&[("apikey", self.api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let rows: Value = resp.json().await?;
        if !status.is_success() {
            anyhow::bail!("FMP quote request failed with status {status}");
        }

        let quotes: Vec<Value> = rows
            .as_array()
            .unwrap_or(&Vec::new())
            .iter()
            .map(|row| {
                serde_json::json!({
                    "symbol": row["symbol"].as_str().unwrap_or(""),
                    "price": row["price"],
                    "exchange": row["exchange"].as_str().unwrap_or(""),
                    "currency": "USD",
                    "ts": row["timestamp"],
                })
            })
            .collect();

        Ok(serde_json::json!({ "quotes": quotes }).to_string())
    }
}

#[async_trait]
impl Tool for FmpQuoteTool {
    fn key(&self) -> &str {
        "market_data_quote"
    }

    fn name(&self) -> &str {
        "Market Data Quote"
    }

    fn description(&self) -> &str {
        "Real-time price quotes for one or more equity tickers via Financial Modeling Prep."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tickers": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ticker symbols, e.g. [\"AAPL\", \"MSFT\"]"
                }
            },
            "required": ["tickers"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let tickers: Vec<String> = parsed["tickers"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if tickers.is_empty() {
            anyhow::bail!("market_data_quote: 'tickers' must be a non-empty array of strings");
        }
        self.fetch(&tickers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_reshapes_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"symbol": "AAPL", "price": 190.12, "exchange": "NASDAQ", "timestamp": 1_700_000_000i64}
            ])))
            .mount(&server)
            .await;

        let tool = FmpQuoteTool::with_base_url("test_key".to_string(), server.uri());
        let result = tool
            .run(&test_context(), r#"{"tickers":["AAPL"]}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["quotes"][0]["symbol"], "AAPL");
        assert_eq!(parsed["quotes"][0]["price"], 190.12);
    }

    #[tokio::test]
    async fn empty_tickers_is_an_error() {
        let tool = FmpQuoteTool::with_base_url("test_key".to_string(), "http://localhost".to_string());
        assert!(tool.run(&test_context(), r#"{"tickers":[]}"#).await.is_err());
    }
}
