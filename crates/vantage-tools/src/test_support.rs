//! Shared fakes for decorator unit tests.
#![cfg(test)]

use crate::base::{Tool, ToolContext};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vantage_bag::SharedBag;

/// A tool that echoes its arguments back, counting invocations so tests can
/// assert how many times the raw tool was actually reached (as opposed to
/// served from cache).
pub struct EchoTool {
    key: String,
    pub calls: AtomicUsize,
}

impl EchoTool {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn key(&self) -> &str {
        &self.key
    }
    fn name(&self) -> &str {
        &self.key
    }
    fn description(&self) -> &str {
        "echoes input"
    }
    fn parameters(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    fn external(&self) -> bool {
        false
    }

    async fn run(&self, _ctx: &ToolContext, args: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(args.to_string())
    }

    fn cacheable(&self) -> bool {
        true
    }
}

pub fn test_context() -> ToolContext {
    ToolContext {
        run_id: "test-run".to_string(),
        bag: Arc::new(SharedBag::new()),
        cancel: CancellationToken::new(),
    }
}
