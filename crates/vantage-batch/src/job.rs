//! Data model for one pass through the batch engine. See spec §3.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unit of work submitted to a [`crate::BatchSubmitter`]. `custom_id` is
/// unique within a run and threads an outcome back to the job that produced
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub custom_id: String,
    pub url: String,
    pub method: String,
    pub body: Value,
}

/// One resolved tool call the model asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub tool_name: String,
    pub arguments: String,
}

/// What one job's LLM turn produced. Exactly one of these per `custom_id` in
/// a [`BatchResult`] (spec §3 "BatchResult").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOutcome {
    FinalContent { content: String },
    ToolCalls { calls: Vec<ToolCall> },
    Error { message: String },
}

/// Response aggregate for one iteration (spec §3 "BatchResult").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchResult {
    pub job_id: String,
    pub successes: usize,
    pub failures: usize,
    pub outcomes: std::collections::HashMap<String, JobOutcome>,
}
