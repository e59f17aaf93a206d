//! Wire-min decorator: packs a normalized payload into the compact
//! array-of-arrays form and replaces the tool's return value with it. See
//! spec §4.B.5 and §6.

use crate::base::{Tool, ToolContext};
use crate::decorators::normalize::NormalizingTool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vantage_bag::Key;
use vantage_normalize::{wiremin, NormalizerRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMinRecord {
    pub tool: String,
    pub at: DateTime<Utc>,
    pub kind: String,
    pub v: u32,
    pub data: wiremin::WireMinPayload,
}

pub struct WireMinTool {
    inner: Arc<dyn Tool>,
    provider: String,
    normalizers: Arc<NormalizerRegistry>,
}

impl WireMinTool {
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
}

#[async_trait::async_trait]
impl Tool for WireMinTool {
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

        let envelope = NormalizingTool::normalize_only(
            &self.normalizers,
            &self.provider,
            self.inner.key(),
            &args_value,
            &result,
        );

        let Some(envelope) = envelope else {
            return Ok(result);
        };
        let Some(packed) = wiremin::pack(&envelope) else {
            return Ok(result);
        };

        let record = WireMinRecord {
            tool: self.inner.key().to_string(),
            at: Utc::now(),
            kind: envelope.kind().as_str().to_string(),
            v: wiremin::WIRE_MIN_VERSION,
            data: packed.clone(),
        };
        ctx.bag
            .update_typed::<Vec<WireMinRecord>>(Key::WIREMIN_TOOL_PAYLOADS, |records| {
                records.push(record);
            });

        Ok(serde_json::to_string(&packed).unwrap_or(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use vantage_normalize::normalizers::default_registry;

    struct QuoteTool;
    #[async_trait::async_trait]
    impl Tool for QuoteTool {
        fn key(&self) -> &str {
            "market_data_quote"
        }
        fn name(&self) -> &str {
            "Market Data Quote"
        }
        fn description(&self) -> &str {
            "fetch quotes"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
            Ok(serde_json::json!({
                "quotes": [
                    {"symbol": "AAPL", "price": 190.1, "exchange": "NASDAQ", "currency": "USD", "ts": 1_700_000_000i64},
                ]
            })
            .to_string())
        }
    }

    #[tokio::test]
    async fn packs_successful_envelope_and_replaces_result() {
        let normalizers = Arc::new(default_registry());
        let inner = Arc::new(QuoteTool);
        let tool = WireMinTool::wrap(inner, "fmp".to_string(), normalizers);
        let ctx = test_context();
        let packed_str = tool.run(&ctx, "{}").await.unwrap();
        let packed: wiremin::WireMinPayload = serde_json::from_str(&packed_str).unwrap();
        assert_eq!(packed.k, "q");
        assert_eq!(packed.d.len(), 1);

        let records: Vec<WireMinRecord> = ctx.bag.get_as(Key::WIREMIN_TOOL_PAYLOADS).unwrap();
        assert_eq!(records.len(), 1);
    }

    struct EmptyQuoteTool;
    #[async_trait::async_trait]
    impl Tool for EmptyQuoteTool {
        fn key(&self) -> &str {
            "market_data_quote"
        }
        fn name(&self) -> &str {
            "Market Data Quote"
        }
        fn description(&self) -> &str {
            "fetch quotes"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
            Ok(serde_json::json!({"quotes": []}).to_string())
        }
    }

    #[tokio::test]
    async fn empty_result_passes_through_unchanged() {
        let normalizers = Arc::new(default_registry());
        let inner = Arc::new(EmptyQuoteTool);
        let tool = WireMinTool::wrap(inner, "fmp".to_string(), normalizers);
        let ctx = test_context();
        let raw = tool.run(&ctx, "{}").await.unwrap();
        assert_eq!(raw, r#"{"quotes":[]}"#);
    }

    #[tokio::test]
    async fn stacked_with_normalize_records_exactly_once() {
        use crate::decorators::normalize::NormalizedResultRecord;

        let normalizers = Arc::new(default_registry());
        let inner = Arc::new(QuoteTool);
        let normalized = NormalizingTool::wrap(inner, "fmp".to_string(), normalizers.clone());
        let tool = WireMinTool::wrap(normalized, "fmp".to_string(), normalizers);
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();

        let normalize_records: Vec<NormalizedResultRecord> =
            ctx.bag.get_as(Key::NORMALIZED_TOOL_RESULTS).unwrap();
        assert_eq!(normalize_records.len(), 1);

        let wiremin_records: Vec<WireMinRecord> = ctx.bag.get_as(Key::WIREMIN_TOOL_PAYLOADS).unwrap();
        assert_eq!(wiremin_records.len(), 1);
    }
}
