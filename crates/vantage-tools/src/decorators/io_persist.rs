//! Writes argument/result pairs to disk for audit. See spec §4.B.3.
//! Unlike every other decorator, a persistence failure here fails the call —
//! recording is a correctness requirement when enabled.

use crate::base::{Tool, ToolContext};
use chrono::Utc;
use std::path::PathBuf;

pub struct IoPersistedTool {
    inner: std::sync::Arc<dyn Tool>,
    data_dir: PathBuf,
}

impl IoPersistedTool {
    pub fn wrap(inner: std::sync::Arc<dyn Tool>, data_dir: PathBuf) -> std::sync::Arc<dyn Tool> {
        std::sync::Arc::new(Self { inner, data_dir })
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f").to_string();
        self.data_dir
            .join("tools_i_o")
            .join(format!("run_{run_id}_{timestamp}"))
    }
}

#[async_trait::async_trait]
impl Tool for IoPersistedTool {
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
        let dir = self.run_dir(&ctx.run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("I/O persistence: failed to create {:?}: {e}", dir))?;

        let input_path = dir.join(format!("{}_input.json", self.inner.key()));
        tokio::fs::write(&input_path, args)
            .await
            .map_err(|e| anyhow::anyhow!("I/O persistence: failed to write input: {e}"))?;

        let result = self.inner.run(ctx, args).await?;

        let output_path = dir.join(format!("{}_output.json", self.inner.key()));
        tokio::fs::write(&output_path, &result)
            .await
            .map_err(|e| anyhow::anyhow!("I/O persistence: failed to write output: {e}"))?;

        Ok(result)
    }
}
