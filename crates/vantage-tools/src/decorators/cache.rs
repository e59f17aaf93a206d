//! Persistent, content-addressed cache decorator. See spec §4.B.2.

use crate::base::{Tool, ToolContext};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vantage_bag::Key;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    created_at: i64,
    expires_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerToolCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub per_tool: HashMap<String, PerToolCacheStats>,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        ratio_of(self.hits, self.misses)
    }

    pub fn storage_health(&self) -> &'static str {
        health_of(self.hit_ratio())
    }
}

impl PerToolCacheStats {
    pub fn hit_ratio(&self) -> f64 {
        ratio_of(self.hits, self.misses)
    }

    pub fn storage_health(&self) -> &'static str {
        health_of(self.hit_ratio())
    }
}

fn ratio_of(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

fn health_of(ratio: f64) -> &'static str {
    if ratio >= 0.7 {
        "healthy"
    } else if ratio >= 0.4 {
        "warning"
    } else {
        "error"
    }
}

/// Sanitize a cache key for use as a filename (spec §4.B.2).
pub fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control() {
            out.push('_');
        } else if c == '[' || c == ']' {
            // strip brackets entirely
        } else {
            out.push(c);
        }
    }
    // collapse runs of underscores
    let mut collapsed = String::with_capacity(out.len());
    let mut last_was_underscore = false;
    for c in out.chars() {
        if c == '_' {
            if !last_was_underscore {
                collapsed.push(c);
            }
            last_was_underscore = true;
        } else {
            collapsed.push(c);
            last_was_underscore = false;
        }
    }

    if collapsed.len() <= 200 {
        return collapsed;
    }

    let mut hasher = Sha256::new();
    hasher.update(collapsed.as_bytes());
    let hash = hex::encode(hasher.finalize());
    let prefix: String = collapsed.chars().take(150).collect();
    format!("{prefix}_{}", &hash[..16])
}

fn content_hash(args: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(args.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

pub struct CachedTool {
    inner: std::sync::Arc<dyn Tool>,
    base_dir: PathBuf,
    ttl: Duration,
    bag: std::sync::Arc<vantage_bag::SharedBag>,
}

impl CachedTool {
    pub fn wrap(
        inner: std::sync::Arc<dyn Tool>,
        base_dir: PathBuf,
        ttl: Duration,
        bag: std::sync::Arc<vantage_bag::SharedBag>,
    ) -> std::sync::Arc<dyn Tool> {
        std::sync::Arc::new(Self {
            inner,
            base_dir,
            ttl,
            bag,
        })
    }

    fn cache_path(&self, args: &str) -> PathBuf {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let sanitized = sanitize_key(&format!(
            "tool_{}_{}_{}",
            self.inner.key(),
            today,
            content_hash(args)
        ));
        self.base_dir.join(today).join(format!("{sanitized}.json"))
    }

    fn record(&self, tool: &str, hit: bool, expired: bool) {
        self.bag.update_typed::<CacheStats>(Key::CACHE_STATS, |s| {
            if expired {
                s.expired += 1;
            }
            if hit {
                s.hits += 1;
            } else {
                s.misses += 1;
            }

            let per_tool = s.per_tool.entry(tool.to_string()).or_default();
            if expired {
                per_tool.expired += 1;
            }
            if hit {
                per_tool.hits += 1;
            } else {
                per_tool.misses += 1;
            }
        });
    }

    /// Reads the cache file, if any. Missing, unparseable, and expired
    /// entries all count as misses (spec §4.B.2); `bool` is `true` when the
    /// specific reason was expiry, for stats purposes.
    async fn read_cache(&self, path: &Path) -> Result<String, bool> {
        let Ok(data) = tokio::fs::read(path).await else {
            return Err(false);
        };
        let Ok(entry) = serde_json::from_slice::<CacheEntry>(&data) else {
            return Err(false);
        };
        if let Some(expires_at) = entry.expires_at {
            if Utc::now().timestamp() >= expires_at {
                return Err(true);
            }
        }
        Ok(entry.value)
    }

    async fn write_cache(&self, path: &Path, value: &str) {
        let entry = CacheEntry {
            value: value.to_string(),
            created_at: Utc::now().timestamp(),
            expires_at: if self.ttl.is_zero() {
                None
            } else {
                Some(Utc::now().timestamp() + self.ttl.as_secs() as i64)
            },
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(error = %e, "cache: failed to create directory, skipping write");
                return;
            }
        }
        match serde_json::to_vec(&entry) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(path, bytes).await {
                    tracing::warn!(error = %e, "cache: write failed, ignored");
                }
            }
            Err(e) => tracing::warn!(error = %e, "cache: serialize failed, ignored"),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CachedTool {
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
        if !self.inner.cacheable() {
            return self.inner.run(ctx, args).await;
        }

        let path = self.cache_path(args);
        let tool = self.inner.key();
        match self.read_cache(&path).await {
            Ok(cached) => {
                self.record(tool, true, false);
                return Ok(cached);
            }
            Err(expired) => self.record(tool, false, expired),
        }

        // Errors are not cached (spec §4.B.2).
        let result = self.inner.run(ctx, args).await?;
        self.write_cache(&path, &result).await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, EchoTool};
    use std::sync::Arc;

    #[test]
    fn sanitize_replaces_unsafe_chars_and_strips_brackets() {
        assert_eq!(sanitize_key("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_key("tool:[AAPL]:daily"), "tool_AAPL_daily");
    }

    #[test]
    fn sanitize_collapses_underscore_runs() {
        assert_eq!(sanitize_key("a///b"), "a_b");
    }

    #[test]
    fn sanitize_hashes_long_names() {
        let long = "x".repeat(300);
        let sanitized = sanitize_key(&long);
        assert!(sanitized.len() < 300);
        assert!(sanitized.starts_with("xxxx"));
    }

    #[tokio::test]
    async fn cache_hit_avoids_second_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let bag = Arc::new(vantage_bag::SharedBag::new());
        let inner = Arc::new(EchoTool::new("newsapi"));
        let tool = CachedTool::wrap(
            inner.clone(),
            dir.path().to_path_buf(),
            Duration::from_secs(3600),
            bag.clone(),
        );
        let ctx = test_context();

        let first = tool.run(&ctx, r#"{"topics":["tech"]}"#).await.unwrap();
        let second = tool.run(&ctx, r#"{"topics":["tech"]}"#).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls(), 1, "second call should be served from cache");

        let stats: CacheStats = bag.get_as(Key::CACHE_STATS).unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        let per_tool = stats.per_tool.get("newsapi").unwrap();
        assert_eq!(per_tool.hits, 1);
        assert_eq!(per_tool.misses, 1);
    }

    #[tokio::test]
    async fn non_cacheable_tool_always_invokes() {
        struct NotCacheable(EchoTool);
        #[async_trait::async_trait]
        impl Tool for NotCacheable {
            fn key(&self) -> &str {
                self.0.key()
            }
            fn name(&self) -> &str {
                self.0.name()
            }
            fn description(&self) -> &str {
                self.0.description()
            }
            fn parameters(&self) -> serde_json::Value {
                self.0.parameters()
            }
            async fn run(&self, ctx: &ToolContext, args: &str) -> anyhow::Result<String> {
                self.0.run(ctx, args).await
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let bag = Arc::new(vantage_bag::SharedBag::new());
        let inner = Arc::new(NotCacheable(EchoTool::new("shell")));
        let tool = CachedTool::wrap(inner, dir.path().to_path_buf(), Duration::from_secs(60), bag);
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();
        tool.run(&ctx, "{}").await.unwrap();
        // no direct call counter here since inner is wrapped; absence of panic plus
        // cache directory staying empty is the behavior under test.
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_counts_as_miss_and_is_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let bag = Arc::new(vantage_bag::SharedBag::new());
        let inner = Arc::new(EchoTool::new("fmp"));
        let tool = CachedTool::wrap(
            inner.clone(),
            dir.path().to_path_buf(),
            Duration::from_millis(1),
            bag,
        );
        let ctx = test_context();
        tool.run(&ctx, "{}").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tool.run(&ctx, "{}").await.unwrap();
        assert_eq!(inner.calls(), 2);
    }
}
