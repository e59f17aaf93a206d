use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use vantage_tools::{Tool, ToolContext};

const EDGAR_API: &str = "https://data.sec.gov/submissions";

/// Recent SEC filings for a company, via EDGAR's submissions API. Filing
/// records don't fit any of the three normalization envelope kinds, so this
/// tool's output intentionally passes through the normalize/wire-min
/// decorators unchanged (spec §4.B.4: no matching normalizer is not an
/// error for the call itself).
pub struct SecFilingsTool {
    base_url: String,
    client: Client,
}

impl SecFilingsTool {
    pub fn new() -> Self {
        Self {
            base_url: EDGAR_API.to_string(),
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

    async fn fetch(&self, cik: &str, limit: usize) -> Result<String> {
        let padded = format!("{cik:0>10}");
        let resp = self
            .client
            .get(format!("{}/CIK{padded}.json", self.base_url))
            .header("User-Agent", "vantage-orchestrator research@vantage.example")
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            anyhow::bail!("SEC EDGAR request failed with status {status}");
        }

        let recent = &body["filings"]["recent"];
        let forms = recent["form"].as_array().cloned().unwrap_or_default();
        let dates = recent["filingDate"].as_array().cloned().unwrap_or_default();
        let accessions = recent["accessionNumber"].as_array().cloned().unwrap_or_default();

        let filings: Vec<Value> = forms
            .iter()
            .zip(dates.iter())
            .zip(accessions.iter())
            .take(limit)
            .map(|((form, date), accession)| {
                serde_json::json!({
                    "form": form,
                    "filed": date,
                    "accession_number": accession,
                })
            })
            .collect();

        Ok(serde_json::json!({ "cik": cik, "filings": filings }).to_string())
    }
}

impl Default for SecFilingsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SecFilingsTool {
    fn key(&self) -> &str {
        "sec_filings_search"
    }

    fn name(&self) -> &str {
        "SEC Filings Search"
    }

    fn description(&self) -> &str {
        "Recent SEC filings (10-K, 10-Q, 8-K, ...) for a company by CIK via EDGAR."
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cik": { "type": "string", "description": "SEC Central Index Key, e.g. \"320193\"" },
                "limit": {
                    "type": "integer",
                    "default": 10,
                    "description": "Maximum number of filings to return"
                }
            },
            "required": ["cik"]
        })
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> Result<String> {
        let parsed: Value = serde_json::from_str(args).unwrap_or(Value::Null);
        let cik = parsed["cik"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("sec_filings_search: 'cik' is required"))?;
        let limit = parsed["limit"].as_u64().unwrap_or(10) as usize;
        self.fetch(cik, limit).await
    }
}
