//! Shared fakes for batch engine unit tests.
#![cfg(test)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vantage_bag::SharedBag;
use vantage_tools::{ManagerSettings, Tool, ToolConfig, ToolContext, ToolManager};

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn key(&self) -> &str {
        "echo"
    }
    fn name(&self) -> &str {
        "echo"
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
        Ok(format!("echoed: {args}"))
    }
}

pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn key(&self) -> &str {
        "failing"
    }
    fn name(&self) -> &str {
        "failing"
    }
    fn description(&self) -> &str {
        "always errors"
    }
    fn parameters(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    fn external(&self) -> bool {
        false
    }
    async fn run(&self, _ctx: &ToolContext, _args: &str) -> anyhow::Result<String> {
        anyhow::bail!("simulated tool failure")
    }
}

/// A tool manager with `echo` and `failing` tools installed, undecorated
/// beyond the mandatory metrics/normalize/wire-min layers (spec §4.B).
pub fn test_tool_manager(bag: Arc<SharedBag>) -> Arc<ToolManager> {
    let settings = ManagerSettings {
        enabled_tools: vec!["echo".to_string(), "failing".to_string()],
        cache_dir: std::env::temp_dir().join("vantage-batch-test-cache"),
        data_dir: std::env::temp_dir().join("vantage-batch-test-data"),
        run_id: "test-run".to_string(),
    };
    let configs = vec![
        ToolConfig::new("echo", |_raw, _bag| Ok(Arc::new(EchoTool) as Arc<dyn Tool>)),
        ToolConfig::new("failing", |_raw, _bag| Ok(Arc::new(FailingTool) as Arc<dyn Tool>)),
    ];
    let normalizers = Arc::new(vantage_normalize::normalizers::default_registry());
    Arc::new(ToolManager::new(&settings, configs, bag, normalizers).unwrap())
}
