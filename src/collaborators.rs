//! Collaborator contracts the orchestrator consumes but does not implement
//! (spec §6): prompt rendering and the interactive LLM run-loop. Each comes
//! with a thin local stub sufficient for offline operation and tests; a real
//! deployment swaps in an HTTP-backed implementation without touching core
//! code (spec §1: these are "external collaborators" by design).

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use vantage_batch::BatchContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisType {
    RiskAnalysis,
    InvestmentResearch,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::RiskAnalysis => "risk_analysis",
            AnalysisType::InvestmentResearch => "investment_research",
        }
    }
}

#[async_trait]
pub trait PromptBuilder: Send + Sync {
    async fn build_prompt(&self, ctx: &BatchContext, analysis_type: AnalysisType) -> anyhow::Result<String>;
}

/// What one interactive run produced (spec §6: `RunResult` exposes
/// `finalOutput`, `newItems`, `rawResponses`, `lastAgent`).
#[derive(Debug, Clone)]
pub struct RunResult {
    pub final_output: Value,
    pub new_items: Vec<Value>,
    pub raw_responses: Vec<Value>,
    pub last_agent: String,
}

#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    pub tools: Vec<Value>,
}

#[async_trait]
pub trait InteractiveClient: Send + Sync {
    async fn run(&self, spec: AgentSpec, input: &str, cancel: CancellationToken) -> anyhow::Result<RunResult>;
}

/// Renders a fixed template per analysis type. Adequate for offline runs and
/// tests; a production deployment renders from the portfolio/profile bag
/// entries via a real template engine instead.
pub struct StubPromptBuilder;

#[async_trait]
impl PromptBuilder for StubPromptBuilder {
    async fn build_prompt(&self, _ctx: &BatchContext, analysis_type: AnalysisType) -> anyhow::Result<String> {
        Ok(match analysis_type {
            AnalysisType::RiskAnalysis => {
                "Assess the risk profile of the current portfolio.".to_string()
            }
            AnalysisType::InvestmentResearch => {
                "Research investment opportunities fitting the current portfolio.".to_string()
            }
        })
    }
}

/// Immediately returns final content with no tool calls. Used by
/// `InteractiveEngine` tests and local runs without a real LLM client.
pub struct StubInteractiveClient;

#[async_trait]
impl InteractiveClient for StubInteractiveClient {
    async fn run(&self, spec: AgentSpec, input: &str, _cancel: CancellationToken) -> anyhow::Result<RunResult> {
        Ok(RunResult {
            final_output: Value::String(format!("stub response to: {input}")),
            new_items: vec![],
            raw_responses: vec![],
            last_agent: spec.name,
        })
    }
}
