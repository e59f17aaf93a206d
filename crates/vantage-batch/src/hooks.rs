//! Engine-specific hook surface the batch driver consumes. Concrete engines
//! (risk analysis, investment research) implement this; the hook surface is
//! the only thing engine-specific about the batch loop (spec §4.D).

use crate::context::BatchContext;
use crate::job::{BatchJob, BatchResult};
use async_trait::async_trait;
use serde_json::Value;
use vantage_bag::Key;

/// Default cap on iterations a hook's `should_continue_iteration` applies
/// when it defers to [`BatchHooks::max_iterations`]. Resolved Open Question
/// (spec §9): hook-driven, per-engine override, default 20.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

#[async_trait]
pub trait BatchHooks: Send + Sync {
    /// Builds the prompt for iteration 0. Failure aborts the run with an
    /// `init` error (spec §4.D step 1).
    async fn get_initial_prompt(&self, ctx: &BatchContext) -> anyhow::Result<String>;

    /// `generate_custom_id(0, 0) == "task0"`; subsequent iterations use
    /// `"task_<iteration>_<job_index>"` (spec §4.D step 2, step f).
    fn generate_custom_id(&self, iteration: usize, job_index: usize) -> String {
        if iteration == 0 {
            "task0".to_string()
        } else {
            format!("task_{iteration}_{job_index}")
        }
    }

    /// Tool function descriptors to attach to every job body.
    fn tool_definitions(&self) -> Vec<Value>;

    /// Model identifier to place in the job body.
    fn model(&self) -> &str;

    /// Batch endpoint URL every job in this run targets.
    fn endpoint_url(&self) -> &str;

    /// `response_format` to place in every job body (spec §3, §4.D step 2).
    /// Default: free-form text, the common case for tool-calling turns.
    fn response_format(&self) -> Value {
        serde_json::json!({"type": "text"})
    }

    async fn pre_iteration(&self, iteration: usize, jobs: &[BatchJob]) -> anyhow::Result<()>;
    async fn post_iteration(&self, iteration: usize, result: &BatchResult) -> anyhow::Result<()>;

    /// A tool call resolved successfully; `result_str` is what the tool
    /// returned (post-decorator). Called once per resolved call, in call
    /// order within a job (spec §4.D ordering guarantee i).
    async fn process_tool_result(
        &self,
        custom_id: &str,
        tool_name: &str,
        result_str: &str,
        ctx: &BatchContext,
    ) -> anyhow::Result<()>;

    /// A job produced final textual content instead of tool calls.
    async fn process_final_result(
        &self,
        custom_id: &str,
        content: &str,
        ctx: &BatchContext,
    ) -> anyhow::Result<()>;

    /// Iteration cap and emptiness are checked by the driver itself; this
    /// hook lets an engine impose additional engine-specific stop
    /// conditions. Default: always continue (driver handles the rest).
    async fn should_continue_iteration(&self, _iteration: usize, _jobs: &[BatchJob]) -> bool {
        true
    }

    /// Per-engine override of the iteration cap (default
    /// [`DEFAULT_MAX_ITERATIONS`]).
    fn max_iterations(&self) -> usize {
        DEFAULT_MAX_ITERATIONS
    }

    /// Bag key the orchestrator checks for after this engine runs (spec
    /// §4.E `executePipeline`).
    fn result_key(&self) -> Key;
}
