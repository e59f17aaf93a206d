//! Wraps a tool whose config sets `allow_concurrent = false`, serializing
//! every call through a single async mutex. See spec §3.

use crate::base::{Tool, ToolContext};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SerializedTool {
    inner: Arc<dyn Tool>,
    lock: Mutex<()>,
}

impl SerializedTool {
    pub fn wrap(inner: Arc<dyn Tool>) -> Arc<dyn Tool> {
        Arc::new(Self {
            inner,
            lock: Mutex::new(()),
        })
    }
}

#[async_trait::async_trait]
impl Tool for SerializedTool {
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
        let _guard = self.lock.lock().await;
        self.inner.run(ctx, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Increments a counter on entry and asserts no other call is in flight,
    /// so overlap inside `run` (not just at the call site) would be caught.
    struct ProbeTool {
        concurrent: AtomicUsize,
        max_seen: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Tool for ProbeTool {
        fn key(&self) -> &str {
            "probe"
        }
        fn name(&self) -> &str {
            "probe"
        }
        fn description(&self) -> &str {
            "concurrency probe"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn calls_run_one_at_a_time() {
        let probe = Arc::new(ProbeTool {
            concurrent: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        });
        let tool = SerializedTool::wrap(probe.clone());
        let ctx = test_context();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tool = tool.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                tool.run(&ctx, "{}").await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(probe.max_seen.load(Ordering::SeqCst), 1);
    }
}
