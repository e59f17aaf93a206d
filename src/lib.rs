//! AI analysis orchestrator for investment portfolios: tool invocation
//! (decorated, rate-limited, cached, normalized), a batch iteration engine
//! driving LLM tool-call turns to convergence, and an orchestrator
//! sequencing engines over one shared bag.

pub mod collaborators;
pub mod config;
pub mod engines;
pub mod errors;
pub mod orchestrator;
pub mod utils;

pub use collaborators::{AgentSpec, AnalysisType, InteractiveClient, PromptBuilder, RunResult};
pub use config::Config;
pub use engines::{Engine, InteractiveEngine, InvestmentResearchEngine, RiskAnalysisEngine};
pub use errors::{VantageError, VantageResult};
pub use orchestrator::EngineOrchestrator;
pub use vantage_bag::{InvestorProfile, Portfolio};
