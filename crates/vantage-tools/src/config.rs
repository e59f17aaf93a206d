use crate::base::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use vantage_bag::SharedBag;

/// Token-bucket rate limit parameters for one tool. See spec §4.B.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst: u32,
    pub requests_per_day: Option<u64>,
}

/// Declares how a tool is built and wrapped (spec §3 "ToolConfig"). Produced
/// by a tool's factory; consumed once by [`crate::manager::ToolManager::new`].
pub struct ToolConfig {
    pub key: String,
    /// The upstream system this tool talks to, e.g. `"fmp"` or `"newsapi"` —
    /// used to tag metrics and external-data-health entries distinctly from
    /// the tool's own key. Defaults to the tool key.
    pub provider: String,
    /// Builds the raw (undecorated) tool from its opaque config blob and a
    /// handle to the shared bag.
    pub constructor: Box<dyn Fn(&Value, Arc<SharedBag>) -> anyhow::Result<Arc<dyn Tool>> + Send + Sync>,
    pub raw_config: Value,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub rate_limit: Option<RateLimitConfig>,
    pub persist_io: bool,
    /// If false, the manager serializes calls to this tool with a mutex
    /// (spec §3: "must be safe for concurrent invocation unless their
    /// config forbids it").
    pub allow_concurrent: bool,
}

impl ToolConfig {
    pub fn new(
        key: impl Into<String>,
        constructor: impl Fn(&Value, Arc<SharedBag>) -> anyhow::Result<Arc<dyn Tool>> + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();
        Self {
            provider: key.clone(),
            key,
            constructor: Box::new(constructor),
            raw_config: Value::Null,
            cache_enabled: false,
            cache_ttl: Duration::from_secs(0),
            rate_limit: None,
            persist_io: false,
            allow_concurrent: true,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    #[must_use]
    pub fn with_raw_config(mut self, raw_config: Value) -> Self {
        self.raw_config = raw_config;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache_enabled = true;
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, enabled: bool) -> Self {
        self.persist_io = enabled;
        self
    }

    #[must_use]
    pub fn single_threaded(mut self) -> Self {
        self.allow_concurrent = false;
        self
    }
}

/// A factory producing a [`ToolConfig`] given the raw JSON config blob for
/// that tool key. Factories are registered explicitly in a
/// [`crate::registry::ToolFactoryRegistry`] at process start — never via a
/// module-`init()` side effect (see `SPEC_FULL.md` §4).
pub type ToolFactory = Box<dyn Fn(&Value, Arc<SharedBag>) -> anyhow::Result<ToolConfig> + Send + Sync>;

/// Top-level manager configuration: which tools to build and where shared
/// filesystem state (cache, I/O audit trail) lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSettings {
    pub enabled_tools: Vec<String>,
    pub cache_dir: std::path::PathBuf,
    pub data_dir: std::path::PathBuf,
    pub run_id: String,
}
