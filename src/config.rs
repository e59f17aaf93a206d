//! On-disk configuration: which tools to enable and how to wrap them, where
//! persisted state lives, and batch-engine tuning. See `SPEC_FULL.md` §1.3.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Generates a `Debug` impl that redacts secret fields, matching the
/// teacher's `config::schema::redact_debug!` so API keys never land in a log
/// line via a stray `{:?}`.
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact_option($field:ident)) => {
        $builder.field(
            stringify!($field),
            &$self.$field.as_ref().map(|_| "[REDACTED]"),
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact_option($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact_option($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub requests_per_second: f64,
    pub burst: u32,
    pub requests_per_day: Option<u64>,
}

/// Per-tool wiring: decorator flags plus the opaque provider blob the
/// tool's own factory parses (spec §3 "ToolConfig": "opaque config").
#[derive(Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub cache_enabled: bool,
    #[serde(default)]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSettings>,
    #[serde(default)]
    pub persist_io: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Non-secret provider-specific fields (e.g. a base URL override).
    #[serde(default)]
    pub extra: Value,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_secs: 0,
            rate_limit: None,
            persist_io: false,
            api_key: None,
            extra: Value::Object(Default::default()),
        }
    }
}

redact_debug!(
    ToolSettings,
    cache_enabled,
    cache_ttl_secs,
    rate_limit,
    persist_io,
    redact_option(api_key),
    extra,
);

impl ToolSettings {
    /// The JSON blob a tool's factory constructor actually reads (spec §3;
    /// see `vantage_tools_builtin::register_all`'s `raw_config["api_key"]`
    /// lookups).
    pub fn to_raw_config(&self) -> Value {
        let mut map = match self.extra.clone() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        if let Some(key) = &self.api_key {
            map.insert("api_key".to_string(), Value::String(key.clone()));
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_max_iterations() -> usize {
    20
}

fn default_concurrency() -> usize {
    16
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enabled_tools: Vec<String>,
    #[serde(default)]
    pub tools: HashMap<String, ToolSettings>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default = "default_bag_dump_interval_secs")]
    pub bag_dump_interval_secs: u64,
}

fn default_data_dir() -> PathBuf {
    crate::utils::get_vantage_home()
        .map(|home| home.join("data"))
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn default_cache_dir() -> PathBuf {
    crate::utils::get_vantage_home()
        .map(|home| home.join("cache"))
        .unwrap_or_else(|_| PathBuf::from("cache"))
}

fn default_bag_dump_interval_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_tools: Vec::new(),
            tools: HashMap::new(),
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            batch: BatchConfig::default(),
            bag_dump_interval_secs: default_bag_dump_interval_secs(),
        }
    }
}

redact_debug!(
    Config,
    enabled_tools,
    tools,
    data_dir,
    cache_dir,
    batch,
    bag_dump_interval_secs,
);

impl Config {
    /// An enabled tool with no matching settings entry is a `Config` error
    /// at startup (spec §7: "fatal at startup").
    pub fn validate(&self) -> Result<()> {
        for key in &self.enabled_tools {
            if !self.tools.contains_key(key) {
                anyhow::bail!("enabled tool '{key}' has no matching settings entry");
            }
        }
        if self.bag_dump_interval_secs == 0 {
            anyhow::bail!("bag_dump_interval_secs must be greater than zero");
        }
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    crate::utils::get_vantage_home()
        .map(|home| home.join("config.json"))
        .unwrap_or_else(|_| PathBuf::from("config.json"))
}

/// Loads config from `path` (or the default location), falling back to
/// `Config::default()` if no file exists. Malformed JSON is fatal.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = default_config_path();
    let path = config_path.unwrap_or(default_path.as_path());

    if !path.exists() {
        let config = Config::default();
        config.validate().context("default configuration failed validation")?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config JSON from {}", path.display()))?;
    let data = migrate_config(data);
    let config: Config =
        serde_json::from_value(data).context("failed to deserialize config")?;
    config.validate().context("configuration validation failed")?;
    Ok(config)
}

pub fn save_config(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let default_path = default_config_path();
    let path = config_path.unwrap_or(default_path.as_path());
    crate::utils::ensure_dir(path.parent().context("config path has no parent")?)?;

    let content = serde_json::to_string_pretty(config)?;
    crate::utils::atomic_write(path, &content)
        .with_context(|| format!("failed to write config to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

/// Hook for forward config migrations. No versions to migrate yet; kept so
/// a schema change never has to touch `load_config`'s call sites.
fn migrate_config(data: Value) -> Value {
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn enabled_tool_without_settings_fails_validation() {
        let mut config = Config::default();
        config.enabled_tools.push("news_search".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_bag_dump_interval_fails_validation() {
        let mut config = Config::default();
        config.bag_dump_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tool_settings_debug_redacts_api_key() {
        let settings = ToolSettings {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn to_raw_config_merges_api_key_with_extra() {
        let settings = ToolSettings {
            api_key: Some("sk-secret".to_string()),
            extra: serde_json::json!({"base_url": "https://example.test"}),
            ..Default::default()
        };
        let raw = settings.to_raw_config();
        assert_eq!(raw["api_key"], "sk-secret");
        assert_eq!(raw["base_url"], "https://example.test");
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.enabled_tools.push("news_search".to_string());
        config.tools.insert("news_search".to_string(), ToolSettings::default());

        save_config(&config, Some(&path)).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.enabled_tools, config.enabled_tools);
    }
}
