//! Sequences engines over one shared bag, owns its lifecycle, and dumps its
//! state to disk periodically and at shutdown (spec §4.E).

use crate::collaborators::PromptBuilder;
use crate::config::Config;
use crate::engines::Engine;
use crate::errors::VantageError;
use crate::utils::task_tracker::TaskTracker;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vantage_bag::{InvestorProfile, Portfolio, SharedBag};
use vantage_tools::ToolManager;

pub struct EngineOrchestrator {
    run_id: String,
    bag: Arc<SharedBag>,
    tools: Arc<ToolManager>,
    engines: Vec<Arc<dyn Engine>>,
    data_dir: PathBuf,
    bag_dump_interval: Duration,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl EngineOrchestrator {
    pub fn new(
        run_id: impl Into<String>,
        config: &Config,
        tools: Arc<ToolManager>,
        engines: Vec<Arc<dyn Engine>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            bag: tools.bag(),
            tools,
            engines,
            data_dir: config.data_dir.clone(),
            bag_dump_interval: Duration::from_secs(config.bag_dump_interval_secs),
            tasks: TaskTracker::new(),
            cancel,
        }
    }

    pub fn bag(&self) -> Arc<SharedBag> {
        self.bag.clone()
    }

    /// Runs init steps in order: tool setup (already done by the caller
    /// constructing the `ToolManager` passed to `new`), portfolio load,
    /// profile load, bag seeding. Each step is fatal with its index on
    /// failure (spec §4.E).
    pub async fn init(
        &self,
        portfolio: Portfolio,
        profile: InvestorProfile,
    ) -> Result<(), VantageError> {
        self.run_step(0, "tool setup", async { Ok(()) }).await?;

        self.run_step(1, "portfolio load", async {
            self.bag.set_portfolio(&portfolio);
            Ok(())
        })
        .await?;

        self.run_step(2, "profile load", async {
            self.bag.set_profile(&profile);
            Ok(())
        })
        .await?;

        self.run_step(3, "bag seeding", async {
            self.bag.set(vantage_bag::Key::BATCH_MODE, &true);
            Ok(())
        })
        .await?;

        Ok(())
    }

    async fn run_step<F>(&self, step: usize, label: &str, fut: F) -> Result<(), VantageError>
    where
        F: std::future::Future<Output = anyhow::Result<()>>,
    {
        fut.await.map_err(|err| {
            tracing::error!(step, label, error = %err, "orchestrator: init step failed");
            VantageError::Init {
                step,
                message: format!("{label}: {err}"),
            }
        })
    }

    /// Runs every engine in order, validating that each wrote its declared
    /// result key before moving on (spec §4.E: "result key validation").
    pub async fn execute_pipeline(
        &self,
        batch_context: &vantage_batch::BatchContext,
    ) -> Result<(), VantageError> {
        self.start_bag_dump_task().await;

        let result = self.run_engines(batch_context).await;
        self.shutdown().await;
        result
    }

    async fn run_engines(&self, batch_context: &vantage_batch::BatchContext) -> Result<(), VantageError> {
        for engine in &self.engines {
            tracing::info!(engine = engine.name(), "orchestrator: engine starting");
            engine
                .execute(batch_context)
                .await
                .with_context(|| format!("engine '{}' failed", engine.name()))
                .map_err(VantageError::Internal)?;

            if !self.bag.has(engine.result_key()) {
                return Err(VantageError::Validation {
                    engine: engine.name().to_string(),
                    result_key: engine.result_key().as_str().to_string(),
                });
            }
            tracing::info!(engine = engine.name(), "orchestrator: engine finished");
        }
        Ok(())
    }

    async fn start_bag_dump_task(&self) {
        let bag = self.bag.clone();
        let data_dir = self.data_dir.clone();
        let run_id = self.run_id.clone();
        let interval = self.bag_dump_interval;
        let cancel = self.cancel.clone();

        self.tasks
            .spawn_auto_cleanup("bag-dump".to_string(), async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            dump_bag(&bag, &data_dir, &run_id).await;
                        }
                    }
                }
            })
            .await;
    }

    /// Cancels the periodic dump task and performs one final dump (spec
    /// §4.E: "dumped... periodically and at termination").
    async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.cancel_all().await;
        dump_bag(&self.bag, &self.data_dir, &self.run_id).await;
        self.tools.close().await;
    }
}

/// Best-effort: a failed dump is logged, never propagated (spec §4.E: "the
/// dump is best-effort and logs errors without aborting").
async fn dump_bag(bag: &SharedBag, data_dir: &std::path::Path, run_id: &str) {
    let timestamp = crate::utils::current_timestamp();
    let path = data_dir
        .join("bag")
        .join(format!("{timestamp}_{run_id}.json"));

    let content = match serde_json::to_string_pretty(&bag.marshal_json()) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(error = %err, "orchestrator: failed to serialize bag dump");
            return;
        }
    };

    if let Err(err) = crate::utils::atomic_write(&path, &content) {
        tracing::warn!(error = %err, path = %path.display(), "orchestrator: bag dump failed");
    } else {
        tracing::debug!(path = %path.display(), "orchestrator: bag dumped");
    }
}

/// Minimal stand-in for the `PromptBuilder` a real orchestrator wires to an
/// engine constructor; exported so a binary entrypoint can use it without
/// reaching into `collaborators` directly.
pub fn default_prompt_builder() -> Arc<dyn PromptBuilder> {
    Arc::new(crate::collaborators::StubPromptBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AnalysisType, PromptBuilder};
    use async_trait::async_trait;
    use vantage_batch::BatchContext;
    use vantage_tools::{ManagerSettings, ToolConfig};

    struct AlwaysWritesResult;

    #[async_trait]
    impl Engine for AlwaysWritesResult {
        fn name(&self) -> &str {
            "stub_engine"
        }
        fn result_key(&self) -> vantage_bag::Key {
            vantage_bag::Key::RISK_ANALYSIS_RESULT
        }
        async fn execute(&self, ctx: &BatchContext) -> anyhow::Result<()> {
            ctx.bag.set(vantage_bag::Key::RISK_ANALYSIS_RESULT, &"x".to_string());
            Ok(())
        }
    }

    struct NeverWritesResult;

    #[async_trait]
    impl Engine for NeverWritesResult {
        fn name(&self) -> &str {
            "broken_engine"
        }
        fn result_key(&self) -> vantage_bag::Key {
            vantage_bag::Key::INVESTMENT_RESEARCH_RESULT
        }
        async fn execute(&self, _ctx: &BatchContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn tools() -> Arc<ToolManager> {
        let bag = Arc::new(SharedBag::new());
        let settings = ManagerSettings {
            enabled_tools: vec![],
            cache_dir: std::env::temp_dir().join("vantage-orchestrator-test-cache"),
            data_dir: std::env::temp_dir().join("vantage-orchestrator-test-data"),
            run_id: "test-run".to_string(),
        };
        let normalizers = Arc::new(vantage_normalize::normalizers::default_registry());
        Arc::new(ToolManager::new(&settings, Vec::<ToolConfig>::new(), bag, normalizers).unwrap())
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.to_path_buf();
        config.bag_dump_interval_secs = 3600;
        config
    }

    #[tokio::test]
    async fn init_seeds_portfolio_and_profile_into_the_bag() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = EngineOrchestrator::new(
            "run-1",
            &config(dir.path()),
            tools(),
            vec![],
            CancellationToken::new(),
        );

        orchestrator
            .init(
                Portfolio(serde_json::json!({"positions": []})),
                InvestorProfile(serde_json::json!({"risk_tolerance": "low"})),
            )
            .await
            .unwrap();

        assert!(orchestrator.bag().has(vantage_bag::Key::PORTFOLIO));
        assert!(orchestrator.bag().has(vantage_bag::Key::PROFILE));
    }

    #[tokio::test]
    async fn execute_pipeline_dumps_the_bag_with_the_engines_result() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let orchestrator = EngineOrchestrator::new(
            "run-2",
            &config(dir.path()),
            tools(),
            vec![Arc::new(AlwaysWritesResult)],
            cancel.clone(),
        );
        let ctx = BatchContext::new("run-2", orchestrator.bag(), cancel);

        orchestrator.execute_pipeline(&ctx).await.unwrap();

        let bag_dir = dir.path().join("bag");
        let entries: Vec<_> = std::fs::read_dir(&bag_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["risk_analysis_result"], "x");
    }

    #[tokio::test]
    async fn execute_pipeline_fails_validation_when_an_engine_skips_its_result_key() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let orchestrator = EngineOrchestrator::new(
            "run-3",
            &config(dir.path()),
            tools(),
            vec![Arc::new(NeverWritesResult)],
            cancel.clone(),
        );
        let ctx = BatchContext::new("run-3", orchestrator.bag(), cancel);

        let result = orchestrator.execute_pipeline(&ctx).await;
        assert!(matches!(result, Err(VantageError::Validation { .. })));
    }

    #[tokio::test]
    async fn default_prompt_builder_distinguishes_analysis_types() {
        let builder = default_prompt_builder();
        let ctx = BatchContext::new("run-4", Arc::new(SharedBag::new()), CancellationToken::new());
        let risk = builder.build_prompt(&ctx, AnalysisType::RiskAnalysis).await.unwrap();
        assert!(risk.contains("risk"));
    }
}
