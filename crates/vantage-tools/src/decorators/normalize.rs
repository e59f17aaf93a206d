//! Normalize decorator. See spec §4.B.4. Side-effect only: appends a record
//! to the bag; the value returned to the caller is always the raw,
//! untouched tool result.

use crate::base::{Tool, ToolContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vantage_bag::Key;
use vantage_normalize::{NormalizationEnvelope, NormalizeStatus, NormalizerRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResultRecord {
    pub tool: String,
    pub status: String,
    pub at: DateTime<Utc>,
    pub raw: String,
    pub normalized: Option<NormalizationEnvelope>,
    pub error: Option<String>,
}

pub struct NormalizingTool {
    inner: Arc<dyn Tool>,
    provider: String,
    normalizers: Arc<NormalizerRegistry>,
}

impl NormalizingTool {
    pub fn wrap(
        inner: Arc<dyn Tool>,
        provider: String,
        normalizers: Arc<NormalizerRegistry>,
    ) -> Arc<dyn Tool> {
        Arc::new(Self {
            inner,
            provider,
            normalizers,
        })
    }

    fn record(
        bag: &vantage_bag::SharedBag,
        tool: &str,
        raw: &str,
        envelope: Option<NormalizationEnvelope>,
        status: &NormalizeStatus,
        at: DateTime<Utc>,
    ) {
        let (status_str, error) = match status {
            NormalizeStatus::Ok => ("ok".to_string(), None),
            NormalizeStatus::Empty { reason } => ("empty".to_string(), Some(reason.clone())),
            NormalizeStatus::Error { message } => ("error".to_string(), Some(message.clone())),
        };
        let record = NormalizedResultRecord {
            tool: tool.to_string(),
            status: status_str,
            at,
            raw: raw.to_string(),
            normalized: envelope,
            error,
        };
        bag.update_typed::<Vec<NormalizedResultRecord>>(Key::NORMALIZED_TOOL_RESULTS, |records| {
            records.push(record);
        });
    }

    /// Normalizes `raw` for `tool_name`/`args`, recording the outcome into
    /// the bag, and returns the envelope on success.
    pub fn normalize_and_record(
        normalizers: &NormalizerRegistry,
        bag: &vantage_bag::SharedBag,
        provider: &str,
        tool_name: &str,
        args: &serde_json::Value,
        raw: &str,
    ) -> Option<NormalizationEnvelope> {
        let at = Utc::now();
        let (envelope, status) = normalizers.normalize(tool_name, provider, args, raw, at);
        Self::record(bag, tool_name, raw, envelope.clone(), &status, at);
        match status {
            NormalizeStatus::Ok => envelope,
            _ => None,
        }
    }

    /// Normalizes `raw` without touching the bag — for the wire-min decorator's
    /// own re-normalization pass above this one (spec §4.B.5), which must not
    /// re-trigger this decorator's `normalized_tool_results` append.
    pub fn normalize_only(
        normalizers: &NormalizerRegistry,
        provider: &str,
        tool_name: &str,
        args: &serde_json::Value,
        raw: &str,
    ) -> Option<NormalizationEnvelope> {
        let (envelope, status) = normalizers.normalize(tool_name, provider, args, raw, Utc::now());
        match status {
            NormalizeStatus::Ok => envelope,
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Tool for NormalizingTool {
    fn key(&self) -> &str {
        self.inner.key()
    }
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn description(&self) -> &str {
        self.inner.description()
    }
    fn parameters(&self) -> serde_json::Value {
        self.inner.parameters()
    }
    fn tags(&self) -> &[String] {
        self.inner.tags()
    }
    fn external(&self) -> bool {
        self.inner.external()
    }
    fn cacheable(&self) -> bool {
        self.inner.cacheable()
    }

    async fn run(&self, ctx: &ToolContext, args: &str) -> anyhow::Result<String> {
        let result = self.inner.run(ctx, args).await?;
        let args_value: serde_json::Value =
            serde_json::from_str(args).unwrap_or(serde_json::Value::Null);
        Self::normalize_and_record(
            &self.normalizers,
            &ctx.bag,
            &self.provider,
            self.inner.key(),
            &args_value,
            &result,
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::sync::Arc;
    use vantage_normalize::normalizers::default_registry;

    struct YFinanceTool;
    #[async_trait::async_trait]
    impl Tool for YFinanceTool {
        fn key(&self) -> &str {
            "market_data_timeseries"
        }
        fn name(&self) -> &str {
            "Market Data Timeseries"
        }
        fn description(&self) -> &str {
            "fetch OHLCV"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
            Ok(serde_json::json!({
                "symbol": "AAPL",
                "open": [serde_json::Value::Null],
                "high": [serde_json::Value::Null],
                "low": [serde_json::Value::Null],
                "close": [serde_json::Value::Null],
                "volume": [serde_json::Value::Null],
                "timestamps": [1_700_000_000],
            })
            .to_string())
        }
    }

    #[tokio::test]
    async fn empty_series_is_recorded_and_passes_through_untouched() {
        let normalizers = Arc::new(default_registry());
        let inner = Arc::new(YFinanceTool);
        let tool = NormalizingTool::wrap(inner, "yfinance".to_string(), normalizers);
        let ctx = test_context();
        let raw = tool.run(&ctx, "{}").await.unwrap();
        assert!(raw.contains("AAPL"));

        let records: Vec<NormalizedResultRecord> =
            ctx.bag.get_as(Key::NORMALIZED_TOOL_RESULTS).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "empty");
        assert_eq!(records[0].error.as_deref(), Some("provider_null_series"));
        assert!(records[0].normalized.is_none());
    }
}
