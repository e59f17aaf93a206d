//! Innermost decorator: token-bucket rate limiting per tool, plus an
//! independent rolling daily counter. See spec §4.B.1.

use crate::base::{Tool, ToolContext};
use crate::config::RateLimitConfig;
use governor::{Quota, RateLimiter as GovernorLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStats {
    pub tokens_available: f64,
    pub daily_used: u64,
    pub daily_limit: Option<u64>,
    pub next_reset_secs: u64,
}

struct DailyCounter {
    used: AtomicU64,
    limit: Option<u64>,
    window_start: Mutex<Instant>,
}

impl DailyCounter {
    fn new(limit: Option<u64>) -> Self {
        Self {
            used: AtomicU64::new(0),
            limit,
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Resets the counter if the current 24h window has elapsed. Returns
    /// `true` if a call may proceed.
    fn try_consume(&self) -> bool {
        {
            let mut start = self.window_start.lock().expect("daily counter mutex poisoned");
            if start.elapsed().as_secs() >= SECS_PER_DAY {
                *start = Instant::now();
                self.used.store(0, Ordering::SeqCst);
            }
        }
        match self.limit {
            None => {
                self.used.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => {
                let prev = self.used.fetch_add(1, Ordering::SeqCst);
                if prev >= limit {
                    self.used.fetch_sub(1, Ordering::SeqCst);
                    false
                } else {
                    true
                }
            }
        }
    }

    fn stats(&self) -> (u64, u64) {
        let start = self.window_start.lock().expect("daily counter mutex poisoned");
        let next_reset = SECS_PER_DAY.saturating_sub(start.elapsed().as_secs());
        (self.used.load(Ordering::SeqCst), next_reset)
    }
}

pub struct RateLimitedTool {
    inner: std::sync::Arc<dyn Tool>,
    limiter: GovernorLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    daily: DailyCounter,
    config: RateLimitConfig,
}

impl RateLimitedTool {
    pub fn wrap(inner: std::sync::Arc<dyn Tool>, config: RateLimitConfig) -> std::sync::Arc<dyn Tool> {
        let per_second = config.requests_per_second.max(0.001);
        let burst = config.burst.max(1);
        let quota = Quota::per_second(
            NonZeroU32::new(per_second.ceil() as u32).unwrap_or(NonZeroU32::new(1).unwrap()),
        )
        .allow_burst(NonZeroU32::new(burst).unwrap_or(NonZeroU32::new(1).unwrap()));

        std::sync::Arc::new(Self {
            limiter: GovernorLimiter::direct(quota),
            daily: DailyCounter::new(config.requests_per_day),
            config,
            inner,
        })
    }

    pub fn stats(&self) -> RateLimitStats {
        let (daily_used, next_reset) = self.daily.stats();
        RateLimitStats {
            tokens_available: f64::from(self.config.burst),
            daily_used,
            daily_limit: self.config.requests_per_day,
            next_reset_secs: next_reset,
        }
    }
}

#[async_trait::async_trait]
impl Tool for RateLimitedTool {
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
        if !self.daily.try_consume() {
            anyhow::bail!(
                "rate limit exceeded: daily limit of {} requests reached for tool '{}'",
                self.config.requests_per_day.unwrap_or(0),
                self.inner.key()
            );
        }

        tokio::select! {
            () = self.limiter.until_ready() => {}
            () = ctx.cancel.cancelled() => {
                anyhow::bail!("rate limit wait cancelled for tool '{}'", self.inner.key());
            }
        }

        self.inner.run(ctx, args).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{EchoTool, test_context};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn allows_burst_then_blocks() {
        let inner = Arc::new(EchoTool::new("echo"));
        let tool = RateLimitedTool::wrap(
            inner,
            RateLimitConfig {
                requests_per_second: 1.0,
                burst: 1,
                requests_per_day: None,
            },
        );
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_surfaces_as_error() {
        let inner = Arc::new(EchoTool::new("echo"));
        let tool = RateLimitedTool::wrap(
            inner,
            RateLimitConfig {
                requests_per_second: 0.1,
                burst: 1,
                requests_per_day: None,
            },
        );
        let ctx = test_context();
        // Exhaust the single burst token synchronously.
        tool.run(&ctx, "{}").await.unwrap();
        ctx.cancel.cancel();
        let result = tokio::time::timeout(StdDuration::from_secs(2), tool.run(&ctx, "{}")).await;
        assert!(result.unwrap().is_err());
    }

    #[test]
    fn daily_counter_enforces_limit() {
        let counter = DailyCounter::new(Some(2));
        assert!(counter.try_consume());
        assert!(counter.try_consume());
        assert!(!counter.try_consume());
    }
}
