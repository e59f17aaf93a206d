use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const YFINANCE_API: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Daily OHLCV history, shaped after the Yahoo Finance chart endpoint.
pub struct YFinanceTimeseriesTool {
    base_url: String,
    client: Client,
}

impl YFinanceTimeseriesTool {
    pub fn new() -> Self {
        Self {
            base_url: YFINANCE_API.to_string(),
            client: Client::new(),
        }
    }

    #[cfg(test)]
    fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    async fn fetch(&self, symbol: &str, range: &str) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/{symbol}", self.base_url))
            .query(&[("range", range), ("interval", "1d")])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            anyhow::bail!("Yahoo Finance chart request failed with status {status}");
        }

        let result = &body["chart"]["result"][0];
        let timestamps = result["timestamp"].clone();
        let quote = &result["indicators"]["quote"][0];
        let currency = result["meta"]["currency"].as_str().unwrap_or("USD");
        let exchange = result["meta"]["exchangeName"].as_str().unwrap_or("");

        Ok(serde_json::json!({
            "symbol": symbol,
            "currency": currency,
            "exchange": exchange,
            "granularity": "1d",
            "timezone": "UTC",
            "timestamps": timestamps,
            "open": quote["open"],
            "high": quote["high"],
            "low": quote["low"],
            "close": quote["close"],
            "volume": quote["volume"],
        })
        .to_string())
    }
}

impl Default for YFinanceTimeseriesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for YFinanceTimeseriesTool {
    fn key(&self) -> &str {
        "market_data_timeseries"
    }

    fn name(&self) -> &str {
        "Market Data Timeseries"
    }

    fn description(&self) -> &str {
        "Daily OHLCV history for a single equity ticker."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Ticker symbol, e.g. \"AAPL\"" },
                "range": {
                    "type": "string",
                    "enum": ["1mo", "3mo", "6mo", "1y", "5y"],
                    "default": "1y",
                    "description": "History window"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let symbol = parsed["symbol"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("market_data_timeseries: 'symbol' is required"))?;
        let range = parsed["range"].as_str().unwrap_or("1y");
        self.fetch(symbol, range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_reshapes_chart_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chart": {
                    "result": [{
                        "meta": {"currency": "USD", "exchangeName": "NMS"},
                        "timestamp": [1_700_000_000i64, 1_700_086_400i64],
                        "indicators": {
                            "quote": [{
                                "open": [190.0, 191.0],
                                "high": [192.0, 193.0],
                                "low": [189.0, 190.5],
                                "close": [191.5, 192.5],
                                "volume": [1_000_000, 1_100_000]
                            }]
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let tool = YFinanceTimeseriesTool::with_base_url(server.uri());
        let result = tool
            .run(&test_context(), r#"{"symbol":"AAPL","range":"1mo"}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["symbol"], "AAPL");
        assert_eq!(parsed["close"][0], 191.5);
    }

    #[tokio::test]
    async fn missing_symbol_is_an_error() {
        let tool = YFinanceTimeseriesTool::with_base_url("http://localhost".to_string());
        assert!(tool.run(&test_context(), "{}").await.is_err());
    }
}
