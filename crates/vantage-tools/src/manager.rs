//! Builds raw tools from their [`ToolConfig`]s and wraps each in the fixed
//! decorator stack, outer to inner:
//! Metrics → WireMin → Normalize → IOPersist → Cache → RateLimit → raw.
//! See spec §3 and §4.B.

use crate::config::{ManagerSettings, ToolConfig};
use crate::decorators::cache::CachedTool;
use crate::decorators::io_persist::IoPersistedTool;
use crate::decorators::metrics::MetricsTool;
use crate::decorators::normalize::NormalizingTool;
use crate::decorators::rate_limit::RateLimitedTool;
use crate::decorators::wiremin::WireMinTool;
use crate::serialize::SerializedTool;
use crate::Tool;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use vantage_bag::SharedBag;
use vantage_normalize::NormalizerRegistry;

pub struct ToolManager {
    tools: HashMap<String, Arc<dyn Tool>>,
    bag: Arc<SharedBag>,
}

impl ToolManager {
    /// Builds every config whose key appears in `settings.enabled_tools`.
    /// A config present but not enabled is skipped; an enabled key with no
    /// matching config is an error — the caller asked for a tool that
    /// doesn't exist.
    pub fn new(
        settings: &ManagerSettings,
        configs: Vec<ToolConfig>,
        bag: Arc<SharedBag>,
        normalizers: Arc<NormalizerRegistry>,
    ) -> anyhow::Result<Self> {
        let mut by_key: HashMap<String, ToolConfig> =
            configs.into_iter().map(|c| (c.key.clone(), c)).collect();

        let mut tools = HashMap::with_capacity(settings.enabled_tools.len());
        for key in &settings.enabled_tools {
            let config = by_key
                .remove(key)
                .ok_or_else(|| anyhow::anyhow!("no tool config registered for enabled key '{key}'"))?;
            let tool = Self::build_one(settings, config, bag.clone(), normalizers.clone())?;
            tracing::debug!(tool = %key, "tool manager: installed tool");
            tools.insert(key.clone(), tool);
        }

        Ok(Self { tools, bag })
    }

    fn build_one(
        settings: &ManagerSettings,
        config: ToolConfig,
        bag: Arc<SharedBag>,
        normalizers: Arc<NormalizerRegistry>,
    ) -> anyhow::Result<Arc<dyn Tool>> {
        let mut tool = (config.constructor)(&config.raw_config, bag.clone())?;

        if !config.allow_concurrent {
            tool = SerializedTool::wrap(tool);
        }
        if let Some(rate_limit) = config.rate_limit.clone() {
            tool = RateLimitedTool::wrap(tool, rate_limit);
        }
        if config.cache_enabled {
            tool = CachedTool::wrap(tool, settings.cache_dir.clone(), config.cache_ttl, bag.clone());
        }
        if config.persist_io {
            tool = IoPersistedTool::wrap(tool, settings.data_dir.clone());
        }
        tool = NormalizingTool::wrap(tool, config.provider.clone(), normalizers.clone());
        tool = WireMinTool::wrap(tool, config.provider.clone(), normalizers);
        tool = MetricsTool::wrap(tool, config.provider);

        Ok(tool)
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(key).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// JSON-schema function descriptors for every installed tool, in the
    /// shape an LLM function-calling request expects (spec §6).
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.values().map(|t| t.to_schema()).collect()
    }

    pub fn bag(&self) -> Arc<SharedBag> {
        self.bag.clone()
    }

    /// No tool currently holds a persistent connection that outlives a
    /// single `run` call; kept as the shutdown hook callers are expected to
    /// invoke so that one can be added later without a call-site change.
    pub async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, EchoTool};
    use std::time::Duration;
    use vantage_normalize::normalizers::default_registry;

    fn settings(enabled: Vec<&str>) -> ManagerSettings {
        ManagerSettings {
            enabled_tools: enabled.into_iter().map(String::to_string).collect(),
            cache_dir: std::env::temp_dir().join("vantage-test-cache"),
            data_dir: std::env::temp_dir().join("vantage-test-data"),
            run_id: "test-run".to_string(),
        }
    }

    fn echo_config(key: &str) -> ToolConfig {
        let key_owned = key.to_string();
        ToolConfig::new(key, move |_raw, _bag| Ok(Arc::new(EchoTool::new(key_owned.clone()))))
    }

    #[test]
    fn builds_only_enabled_tools() {
        let bag = Arc::new(SharedBag::new());
        let normalizers = Arc::new(default_registry());
        let manager = ToolManager::new(
            &settings(vec!["echo_a"]),
            vec![echo_config("echo_a"), echo_config("echo_b")],
            bag,
            normalizers,
        )
        .unwrap();
        assert_eq!(manager.list(), vec!["echo_a"]);
        assert!(manager.get("echo_b").is_none());
    }

    #[test]
    fn missing_config_for_enabled_key_is_an_error() {
        let bag = Arc::new(SharedBag::new());
        let normalizers = Arc::new(default_registry());
        let result = ToolManager::new(&settings(vec!["missing"]), vec![], bag, normalizers);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn installed_tool_runs_through_the_full_stack() {
        let bag = Arc::new(SharedBag::new());
        let normalizers = Arc::new(default_registry());
        let config = echo_config("echo_a").with_cache(Duration::from_secs(60));
        let manager = ToolManager::new(&settings(vec!["echo_a"]), vec![config], bag.clone(), normalizers)
            .unwrap();
        let tool = manager.get("echo_a").unwrap();
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();

        assert!(bag.has(vantage_bag::Key::TOOL_METRICS));
    }
}
