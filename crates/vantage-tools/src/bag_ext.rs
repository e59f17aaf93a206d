//! Typed [`SharedBag`] accessors for the types this crate owns (spec §2:
//! "typed accessors... while the common ones get compile-time-checked
//! constants"). An extension trait rather than inherent methods on
//! `SharedBag` itself — `vantage-bag` can't depend back on this crate.

use crate::decorators::cache::CacheStats;
use crate::decorators::metrics::{ExternalDataHealth, ToolMetrics};
use crate::decorators::normalize::NormalizedResultRecord;
use crate::decorators::rate_limit::RateLimitStats;
use crate::decorators::wiremin::WireMinRecord;
use vantage_bag::{Key, SharedBag};

pub trait ToolBagExt {
    /// Aggregated and per-tool call counts, durations, and recent errors
    /// (spec §4.B.3).
    fn tool_metrics(&self) -> ToolMetrics;

    /// Aggregated and per-tool cache hit/miss/expiry counters (spec §4.B.2).
    fn cache_stats(&self) -> CacheStats;

    /// Token-bucket and daily-window rate limiter state (spec §4.B.1).
    fn rate_limit_stats(&self) -> Option<RateLimitStats>;

    /// Per-provider health derived from recent tool call outcomes (spec
    /// §4.B.3).
    fn external_data_health(&self) -> ExternalDataHealth;

    /// Every recorded normalize-decorator outcome, in call order (spec
    /// §4.B.4).
    fn normalized_tool_results(&self) -> Vec<NormalizedResultRecord>;

    /// Every wire-min payload packed so far, in call order (spec §4.B.5).
    fn wiremin_tool_payloads(&self) -> Vec<WireMinRecord>;
}

impl ToolBagExt for SharedBag {
    fn tool_metrics(&self) -> ToolMetrics {
        self.get_as(Key::TOOL_METRICS).unwrap_or_default()
    }

    fn cache_stats(&self) -> CacheStats {
        self.get_as(Key::CACHE_STATS).unwrap_or_default()
    }

    fn rate_limit_stats(&self) -> Option<RateLimitStats> {
        self.get_as(Key::RATE_LIMIT_STATS)
    }

    fn external_data_health(&self) -> ExternalDataHealth {
        self.get_as(Key::EXTERNAL_DATA_HEALTH).unwrap_or_default()
    }

    fn normalized_tool_results(&self) -> Vec<NormalizedResultRecord> {
        self.get_as(Key::NORMALIZED_TOOL_RESULTS).unwrap_or_default()
    }

    fn wiremin_tool_payloads(&self) -> Vec<WireMinRecord> {
        self.get_as(Key::WIREMIN_TOOL_PAYLOADS).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::metrics::ToolComputation;
    use chrono::Utc;

    #[test]
    fn absent_keys_yield_empty_defaults() {
        let bag = SharedBag::new();
        assert_eq!(bag.tool_metrics().calls, 0);
        assert_eq!(bag.cache_stats().hits, 0);
        assert!(bag.rate_limit_stats().is_none());
        assert!(bag.external_data_health().is_empty());
        assert!(bag.normalized_tool_results().is_empty());
        assert!(bag.wiremin_tool_payloads().is_empty());
    }

    #[test]
    fn tool_metrics_reflects_recorded_computations() {
        let bag = SharedBag::new();
        bag.update_typed::<ToolMetrics>(Key::TOOL_METRICS, |m| {
            m.calls += 1;
            m.successes += 1;
        });
        bag.update_typed::<Vec<ToolComputation>>(Key::TOOL_COMPUTATIONS, |c| {
            c.push(ToolComputation {
                tool: "echo".to_string(),
                start_time: Utc::now(),
                duration_ms: 12,
                success: true,
                error: None,
            });
        });

        let metrics = bag.tool_metrics();
        assert_eq!(metrics.calls, 1);
        assert_eq!(metrics.successes, 1);
    }
}
