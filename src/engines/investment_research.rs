use crate::collaborators::{AnalysisType, PromptBuilder};
use crate::engines::Engine;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vantage_bag::Key;
use vantage_batch::{BatchContext, BatchEngine, BatchHooks, BatchJob, BatchResult, BatchSubmitter};
use vantage_tools::ToolManager;

struct InvestmentResearchHooks {
    prompt_builder: Arc<dyn PromptBuilder>,
    tool_definitions: Vec<Value>,
    model: String,
    endpoint_url: String,
    max_iterations: usize,
}

#[async_trait]
impl BatchHooks for InvestmentResearchHooks {
    async fn get_initial_prompt(&self, ctx: &BatchContext) -> anyhow::Result<String> {
        self.prompt_builder
            .build_prompt(ctx, AnalysisType::InvestmentResearch)
            .await
    }

    fn tool_definitions(&self) -> Vec<Value> {
        self.tool_definitions.clone()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    async fn pre_iteration(&self, iteration: usize, jobs: &[BatchJob]) -> anyhow::Result<()> {
        tracing::debug!(iteration, jobs = jobs.len(), "investment research: iteration starting");
        Ok(())
    }

    async fn post_iteration(&self, iteration: usize, result: &BatchResult) -> anyhow::Result<()> {
        tracing::debug!(iteration, successes = result.successes, failures = result.failures, "investment research: iteration finished");
        Ok(())
    }

    async fn process_tool_result(
        &self,
        custom_id: &str,
        tool_name: &str,
        result_str: &str,
        ctx: &BatchContext,
    ) -> anyhow::Result<()> {
        let custom_id = custom_id.to_string();
        let tool_name = tool_name.to_string();
        let result_str = result_str.to_string();
        ctx.bag.update(Key::custom("investment_research_tool_results"), move |current| {
            let mut entries = match current {
                Value::Array(entries) => entries,
                _ => Vec::new(),
            };
            entries.push(serde_json::json!({
                "custom_id": custom_id,
                "tool": tool_name,
                "result": result_str,
            }));
            Value::Array(entries)
        });
        Ok(())
    }

    async fn process_final_result(&self, _custom_id: &str, content: &str, ctx: &BatchContext) -> anyhow::Result<()> {
        ctx.bag.set(Key::INVESTMENT_RESEARCH_RESULT, &content.to_string());
        Ok(())
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn result_key(&self) -> Key {
        Key::INVESTMENT_RESEARCH_RESULT
    }
}

/// Produces `investment_research_result` via the batch driver. Structurally
/// identical to `RiskAnalysisEngine` — only the hook bodies (prompt type,
/// result key) differ, confirming the batch driver itself carries none of
/// the engine-specific logic (spec §4.D: "the hook surface is the only
/// thing engine-specific about the batch loop").
pub struct InvestmentResearchEngine {
    hooks: Arc<InvestmentResearchHooks>,
    submitter: Arc<dyn BatchSubmitter>,
    tools: Arc<ToolManager>,
}

impl InvestmentResearchEngine {
    pub fn new(
        prompt_builder: Arc<dyn PromptBuilder>,
        submitter: Arc<dyn BatchSubmitter>,
        tools: Arc<ToolManager>,
        model: impl Into<String>,
        endpoint_url: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        let tool_definitions = tools.definitions();
        Self {
            hooks: Arc::new(InvestmentResearchHooks {
                prompt_builder,
                tool_definitions,
                model: model.into(),
                endpoint_url: endpoint_url.into(),
                max_iterations,
            }),
            submitter,
            tools,
        }
    }
}

#[async_trait]
impl Engine for InvestmentResearchEngine {
    fn name(&self) -> &str {
        "investment_research"
    }

    fn result_key(&self) -> Key {
        Key::INVESTMENT_RESEARCH_RESULT
    }

    async fn execute(&self, ctx: &BatchContext) -> anyhow::Result<()> {
        BatchEngine::new(self.hooks.clone(), self.submitter.clone(), self.tools.clone())
            .run(ctx)
            .await
    }
}
