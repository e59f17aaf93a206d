use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vantage::{
    config, orchestrator::default_prompt_builder, Config, EngineOrchestrator, Engine,
    InvestmentResearchEngine, InvestorProfile, Portfolio, RiskAnalysisEngine,
};
use vantage_bag::SharedBag;
use vantage_batch::BatchContext;
use vantage_tools::{ManagerSettings, ToolFactoryRegistry, ToolManager};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,vantage=debug".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::load_config(None).context("failed to load configuration")?;
    let run_id = uuid::Uuid::new_v4().to_string();
    let cancel = CancellationToken::new();

    let bag = Arc::new(SharedBag::new());
    let tools = build_tool_manager(&config, &run_id, bag.clone())?;

    let prompt_builder = default_prompt_builder();
    let submitter: Arc<dyn vantage_batch::BatchSubmitter> = Arc::new(UnconfiguredSubmitter);
    let engines: Vec<Arc<dyn Engine>> = vec![
        Arc::new(RiskAnalysisEngine::new(
            prompt_builder.clone(),
            submitter.clone(),
            tools.clone(),
            "gpt-4o",
            "https://api.openai.com/v1/chat/completions",
            config.batch.max_iterations,
        )),
        Arc::new(InvestmentResearchEngine::new(
            prompt_builder,
            submitter,
            tools.clone(),
            "gpt-4o",
            "https://api.openai.com/v1/chat/completions",
            config.batch.max_iterations,
        )),
    ];

    let orchestrator = EngineOrchestrator::new(run_id.clone(), &config, tools, engines, cancel.clone());
    orchestrator
        .init(
            Portfolio(serde_json::Value::Null),
            InvestorProfile(serde_json::Value::Null),
        )
        .await?;

    let ctx = BatchContext::new(run_id, orchestrator.bag(), cancel);
    orchestrator.execute_pipeline(&ctx).await?;

    Ok(())
}

fn build_tool_manager(config: &Config, run_id: &str, bag: Arc<SharedBag>) -> Result<Arc<ToolManager>> {
    let mut registry = ToolFactoryRegistry::new();
    vantage_tools_builtin::register_all(&mut registry);

    let mut configs = Vec::with_capacity(config.enabled_tools.len());
    for key in &config.enabled_tools {
        let settings = config
            .tools
            .get(key)
            .with_context(|| format!("enabled tool '{key}' has no matching settings entry"))?;
        let mut tool_config = registry
            .build(key, &settings.to_raw_config(), bag.clone())
            .with_context(|| format!("failed to build tool '{key}'"))?;

        if settings.cache_enabled {
            tool_config = tool_config.with_cache(std::time::Duration::from_secs(settings.cache_ttl_secs));
        }
        if let Some(rate_limit) = &settings.rate_limit {
            tool_config = tool_config.with_rate_limit(vantage_tools::RateLimitConfig {
                requests_per_second: rate_limit.requests_per_second,
                burst: rate_limit.burst,
                requests_per_day: rate_limit.requests_per_day,
            });
        }
        tool_config = tool_config.with_persistence(settings.persist_io);
        configs.push(tool_config);
    }

    let settings = ManagerSettings {
        enabled_tools: config.enabled_tools.clone(),
        cache_dir: config.cache_dir.clone(),
        data_dir: config.data_dir.clone(),
        run_id: run_id.to_string(),
    };
    let normalizers = Arc::new(vantage_normalize::normalizers::default_registry());
    Ok(Arc::new(ToolManager::new(&settings, configs, bag, normalizers)?))
}

/// No batch submission collaborator is wired up by default — a real
/// deployment supplies one per `SPEC_FULL.md` §7. Running an engine with
/// this installed fails loudly instead of silently no-op-ing.
struct UnconfiguredSubmitter;

#[async_trait::async_trait]
impl vantage_batch::BatchSubmitter for UnconfiguredSubmitter {
    async fn submit(&self, _jobs: Vec<vantage_batch::BatchJob>) -> Result<String> {
        anyhow::bail!("no BatchSubmitter configured; wire a real implementation before running engines")
    }

    async fn await_result(
        &self,
        _job_id: &str,
        _cancel: CancellationToken,
    ) -> Result<vantage_batch::BatchResult> {
        anyhow::bail!("no BatchSubmitter configured; wire a real implementation before running engines")
    }
}
