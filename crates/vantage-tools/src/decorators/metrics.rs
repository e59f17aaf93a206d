//! Metrics decorator — always outermost. See spec §4.B.6.

use crate::base::{Tool, ToolContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use vantage_bag::Key;

const LAST_ERRORS_CAPACITY: usize = 5;
const CONSECUTIVE_FAILURES_DEGRADED: u32 = 1;
const CONSECUTIVE_FAILURES_DOWN: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolComputation {
    pub tool: String,
    pub start_time: DateTime<Utc>,
    pub duration_ms: u128,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerToolMetrics {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
    pub total_duration_ms: u128,
}

impl PerToolMetrics {
    pub fn average_duration_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.calls as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.successes as f64 / self.calls as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolMetrics {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
    pub total_duration_ms: u128,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub per_tool: HashMap<String, PerToolMetrics>,
    pub last_errors: VecDeque<String>,
}

impl ToolMetrics {
    pub fn average_duration_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.calls as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.successes as f64 / self.calls as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub status: ProviderStatus,
    pub avg_latency_ms: f64,
    pub last_errors: VecDeque<String>,
    #[serde(default)]
    consecutive_failures: u32,
    #[serde(default)]
    latency_samples: u64,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            last_success: None,
            last_failure: None,
            status: ProviderStatus::Healthy,
            avg_latency_ms: 0.0,
            last_errors: VecDeque::new(),
            consecutive_failures: 0,
            latency_samples: 0,
        }
    }
}

impl ProviderHealth {
    fn record(&mut self, success: bool, duration_ms: u128, error: Option<&str>, at: DateTime<Utc>) {
        self.latency_samples += 1;
        let latency = duration_ms as f64;
        self.avg_latency_ms += (latency - self.avg_latency_ms) / self.latency_samples as f64;

        if success {
            self.last_success = Some(at);
            self.consecutive_failures = 0;
        } else {
            self.last_failure = Some(at);
            self.consecutive_failures += 1;
            if let Some(err) = error {
                if self.last_errors.len() == LAST_ERRORS_CAPACITY {
                    self.last_errors.pop_front();
                }
                self.last_errors.push_back(err.to_string());
            }
        }

        self.status = if self.consecutive_failures >= CONSECUTIVE_FAILURES_DOWN {
            ProviderStatus::Down
        } else if self.consecutive_failures >= CONSECUTIVE_FAILURES_DEGRADED {
            ProviderStatus::Degraded
        } else {
            ProviderStatus::Healthy
        };
    }
}

pub type ExternalDataHealth = HashMap<String, ProviderHealth>;

pub struct MetricsTool {
    inner: Arc<dyn Tool>,
    provider: String,
}

impl MetricsTool {
    pub fn wrap(inner: Arc<dyn Tool>, provider: String) -> Arc<dyn Tool> {
        Arc::new(Self { inner, provider })
    }
}

#[async_trait::async_trait]
impl Tool for MetricsTool {
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
        let tool_key = self.inner.key().to_string();
        let start_time = Utc::now();
        let started = Instant::now();
        let result = self.inner.run(ctx, args).await;
        let duration_ms = started.elapsed().as_millis();
        let success = result.is_ok();
        let error_str = result.as_ref().err().map(std::string::ToString::to_string);

        ctx.bag
            .update_typed::<Vec<ToolComputation>>(Key::TOOL_COMPUTATIONS, |log| {
                log.push(ToolComputation {
                    tool: tool_key.clone(),
                    start_time,
                    duration_ms,
                    success,
                    error: error_str.clone(),
                });
            });

        ctx.bag.update_typed::<ToolMetrics>(Key::TOOL_METRICS, |m| {
            m.calls += 1;
            m.total_duration_ms += duration_ms;
            if success {
                m.successes += 1;
            } else {
                m.errors += 1;
                if let Some(err) = &error_str {
                    if m.last_errors.len() == LAST_ERRORS_CAPACITY {
                        m.last_errors.pop_front();
                    }
                    m.last_errors.push_back(err.clone());
                }
            }
            let per_tool = m.per_tool.entry(tool_key.clone()).or_default();
            per_tool.calls += 1;
            per_tool.total_duration_ms += duration_ms;
            if success {
                per_tool.successes += 1;
            } else {
                per_tool.errors += 1;
            }
        });

        ctx.bag
            .update_typed::<ExternalDataHealth>(Key::EXTERNAL_DATA_HEALTH, |health| {
                let entry = health.entry(self.provider.clone()).or_default();
                entry.record(success, duration_ms, error_str.as_deref(), start_time);
            });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, EchoTool};

    #[tokio::test]
    async fn records_computation_and_aggregate_metrics() {
        let inner = Arc::new(EchoTool::new("fmp"));
        let tool = MetricsTool::wrap(inner, "fmp-provider".to_string());
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();
        tool.run(&ctx, "{}").await.unwrap();

        let computations: Vec<ToolComputation> = ctx.bag.get_as(Key::TOOL_COMPUTATIONS).unwrap();
        assert_eq!(computations.len(), 2);

        let metrics: ToolMetrics = ctx.bag.get_as(Key::TOOL_METRICS).unwrap();
        assert_eq!(metrics.calls, 2);
        assert_eq!(metrics.successes, 2);
        assert_eq!(metrics.errors, 0);

        let health: ExternalDataHealth = ctx.bag.get_as(Key::EXTERNAL_DATA_HEALTH).unwrap();
        assert_eq!(health["fmp-provider"].status, ProviderStatus::Healthy);
    }

    struct FailingTool;
    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn key(&self) -> &str {
            "flaky"
        }
        fn name(&self) -> &str {
            "flaky"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn repeated_failures_mark_provider_down() {
        let tool = MetricsTool::wrap(Arc::new(FailingTool), "flaky-provider".to_string());
        let ctx = test_context();
        for _ in 0..3 {
            let _ = tool.run(&ctx, "{}").await;
        }
        let health: ExternalDataHealth = ctx.bag.get_as(Key::EXTERNAL_DATA_HEALTH).unwrap();
        assert_eq!(health["flaky-provider"].status, ProviderStatus::Down);
        let metrics: ToolMetrics = ctx.bag.get_as(Key::TOOL_METRICS).unwrap();
        assert_eq!(metrics.errors, 3);
        assert_eq!(metrics.last_errors.len(), 3);
    }
}
