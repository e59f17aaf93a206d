use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const FRED_API: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Economic indicator series (CPI, unemployment, GDP, ...) from FRED. Shaped
/// as a flat timeseries — `open`/`high`/`low`/`close` all carry the same
/// observation value — so it routes through the same timeseries normalizer
/// as OHLCV data rather than needing a fourth envelope kind.
pub struct FredIndicatorTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl FredIndicatorTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: FRED_API.to_string(),
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

    async fn fetch(&self, series_id: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            anyhow::bail!("FRED request failed with status {status}");
        }

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for obs in body["observations"].as_array().unwrap_or(&Vec::new()) {
            let Some(date) = obs["date"].as_str() else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                continue;
            };
            let epoch = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
            let value = obs["value"].as_str().and_then(|s| s.parse::<f64>().ok());
            timestamps.push(Value::from(epoch));
            values.push(value.map(Value::from).unwrap_or(Value::Null));
        }

        Ok(serde_json::json!({
            "symbol": series_id,
            "currency": "USD",
            "exchange": "",
            "granularity": "monthly",
            "timezone": "UTC",
            "timestamps": timestamps,
            "open": values.clone(),
            "high": values.clone(),
            "low": values.clone(),
            "close": values,
            "volume": vec![Value::from(0); timestamps.len()],
        })
        .to_string())
    }
}

#[async_trait]
impl Tool for FredIndicatorTool {
    fn key(&self) -> &str {
        "economic_indicator_timeseries"
    }

    fn name(&self) -> &str {
        "Economic Indicator"
    }

    fn description(&self) -> &str {
        "Historical observations for a FRED economic indicator series (CPI, unemployment rate, GDP, ...)."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "series_id": {
                    "type": "string",
                    "description": "FRED series ID, e.g. \"CPIAUCSL\" or \"UNRATE\""
                }
            },
            "required": ["series_id"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let series_id = parsed["series_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("economic_indicator_timeseries: 'series_id' is required"))?;
        self.fetch(series_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_reshapes_observations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "observations": [
                    {"date": "2026-01-01", "value": "3.4"},
                    {"date": "2026-02-01", "value": "."},
                ]
            })))
            .mount(&server)
            .await;

        let tool = FredIndicatorTool::with_base_url("test_key".to_string(), server.uri());
        let result = tool
            .run(&test_context(), r#"{"series_id":"UNRATE"}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["close"][0], 3.4);
        assert!(parsed["close"][1].is_null());
    }

    #[tokio::test]
    async fn missing_series_id_is_an_error() {
        let tool = FredIndicatorTool::with_base_url("test_key".to_string(), "http://localhost".to_string());
        assert!(tool.run(&test_context(), "{}").await.is_err());
    }
}
