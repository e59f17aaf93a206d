//! The generic batch driver: `START → BUILDING → SUBMITTING → POLLING →
//! PROCESSING → DECIDE` (spec §4.D). Everything engine-specific lives in a
//! [`BatchHooks`] implementation; this file is the loop every concrete engine
//! shares.

use crate::context::BatchContext;
use crate::hooks::BatchHooks;
use crate::job::{BatchJob, JobOutcome};
use crate::submitter::BatchSubmitter;
use anyhow::Context as _;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use vantage_tools::{ToolContext, ToolManager};

/// Default bound on jobs dispatched concurrently within one iteration
/// (spec §4.D step e: "different jobs are fanned out in parallel, bounded by
/// an engine-level concurrency ceiling").
pub const DEFAULT_CONCURRENCY: usize = 16;

pub struct BatchEngine {
    hooks: Arc<dyn BatchHooks>,
    submitter: Arc<dyn BatchSubmitter>,
    tools: Arc<ToolManager>,
    concurrency: usize,
}

impl BatchEngine {
    pub fn new(
        hooks: Arc<dyn BatchHooks>,
        submitter: Arc<dyn BatchSubmitter>,
        tools: Arc<ToolManager>,
    ) -> Self {
        Self {
            hooks,
            submitter,
            tools,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs the driver loop to convergence. Produces no return value — all
    /// useful state is written to the bag via hooks (spec §4.D step 5); the
    /// orchestrator checks `bag.has(hooks.result_key())` afterward.
    pub async fn run(&self, ctx: &BatchContext) -> anyhow::Result<()> {
        let prompt = self
            .hooks
            .get_initial_prompt(ctx)
            .await
            .context("batch engine: failed to build initial prompt")?;

        let custom_id0 = self.hooks.generate_custom_id(0, 0);
        let initial_messages = vec![serde_json::json!({"role": "user", "content": prompt})];
        let mut histories: HashMap<String, Vec<Value>> = HashMap::new();
        histories.insert(custom_id0.clone(), initial_messages.clone());
        let mut jobs = vec![self.build_job(&custom_id0, &initial_messages)];

        let mut iteration = 0usize;
        while !jobs.is_empty()
            && iteration < self.hooks.max_iterations()
            && self.hooks.should_continue_iteration(iteration, &jobs).await
        {
            if ctx.cancel.is_cancelled() {
                anyhow::bail!("batch engine: run cancelled before iteration {iteration}");
            }

            self.hooks
                .pre_iteration(iteration, &jobs)
                .await
                .with_context(|| format!("batch engine: pre_iteration hook failed at iteration {iteration}"))?;

            let job_id = self
                .submitter
                .submit(jobs.clone())
                .await
                .with_context(|| format!("batch engine: submission failed at iteration {iteration}"))?;
            let result = self
                .submitter
                .await_result(&job_id, ctx.cancel.clone())
                .await
                .with_context(|| format!("batch engine: await failed at iteration {iteration}"))?;

            self.hooks
                .post_iteration(iteration, &result)
                .await
                .with_context(|| format!("batch engine: post_iteration hook failed at iteration {iteration}"))?;

            tracing::info!(
                iteration,
                successes = result.successes,
                failures = result.failures,
                "batch engine: iteration processed"
            );

            // Per-job tool calls dispatch sequentially; jobs themselves fan out
            // in parallel, bounded by `self.concurrency` (spec §4.D step e).
            let semaphore = Arc::new(tokio::sync::Semaphore::new(self.concurrency));
            let mut join_set = tokio::task::JoinSet::new();
            for job in &jobs {
                let Some(outcome) = result.outcomes.get(&job.custom_id).cloned() else {
                    continue;
                };
                let history = histories.get(&job.custom_id).cloned().unwrap_or_default();
                let hooks = self.hooks.clone();
                let tools = self.tools.clone();
                let custom_id = job.custom_id.clone();
                let job_ctx = ctx.clone();
                let permit = semaphore.clone();
                join_set.spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore never closed");
                    dispatch_job(hooks, tools, custom_id, outcome, history, job_ctx).await
                });
            }

            let mut followups = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                let dispatch_result = joined.context("batch engine: job task panicked")?;
                if let Some((custom_id, messages)) = dispatch_result? {
                    followups.push((custom_id, messages));
                }
            }

            let mut next_jobs = Vec::with_capacity(followups.len());
            let mut next_histories = HashMap::with_capacity(followups.len());
            for (job_index, (_prev_custom_id, messages)) in followups.into_iter().enumerate() {
                let next_custom_id = self.hooks.generate_custom_id(iteration + 1, job_index);
                next_jobs.push(self.build_job(&next_custom_id, &messages));
                next_histories.insert(next_custom_id, messages);
            }

            histories = next_histories;
            jobs = next_jobs;
            iteration += 1;
        }

        Ok(())
    }

    fn build_job(&self, custom_id: &str, messages: &[Value]) -> BatchJob {
        BatchJob {
            custom_id: custom_id.to_string(),
            url: self.hooks.endpoint_url().to_string(),
            method: "POST".to_string(),
            body: serde_json::json!({
                "model": self.hooks.model(),
                "messages": messages,
                "tools": self.hooks.tool_definitions(),
                "tool_choice": "auto",
                "response_format": self.hooks.response_format(),
            }),
        }
    }
}

/// Resolves one job's outcome: runs its tool calls (if any) through the tool
/// manager in call order, or hands final content to the hook. Returns the
/// next iteration's message history for jobs that need a follow-up job, or
/// `None` for jobs that terminated.
async fn dispatch_job(
    hooks: Arc<dyn BatchHooks>,
    tools: Arc<ToolManager>,
    custom_id: String,
    outcome: JobOutcome,
    history: Vec<Value>,
    ctx: BatchContext,
) -> anyhow::Result<Option<(String, Vec<Value>)>> {
    match outcome {
        JobOutcome::ToolCalls { calls } => {
            let mut tool_call_turn = Vec::with_capacity(calls.len());
            let mut tool_messages = Vec::with_capacity(calls.len());

            for call in &calls {
                tool_call_turn.push(serde_json::json!({
                    "id": call.id,
                    "type": "function",
                    "function": {"name": call.tool_name, "arguments": call.arguments},
                }));

                let content = match tools.get(&call.tool_name) {
                    Some(tool) => {
                        let tool_ctx = ToolContext {
                            run_id: ctx.run_id.clone(),
                            bag: ctx.bag.clone(),
                            cancel: ctx.cancel.clone(),
                        };
                        match tool.run(&tool_ctx, &call.arguments).await {
                            Ok(result) => {
                                hooks
                                    .process_tool_result(&custom_id, &call.tool_name, &result, &ctx)
                                    .await?;
                                result
                            }
                            Err(err) => {
                                tracing::warn!(tool = %call.tool_name, error = %err, "batch engine: tool call failed, surfacing error to next turn");
                                format!("error: {err}")
                            }
                        }
                    }
                    None => {
                        tracing::warn!(tool = %call.tool_name, "batch engine: unknown tool requested");
                        format!("error: unknown tool '{}'", call.tool_name)
                    }
                };

                tool_messages.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": content,
                }));
            }

            let mut next_messages = history;
            next_messages.push(serde_json::json!({"role": "assistant", "tool_calls": tool_call_turn}));
            next_messages.extend(tool_messages);
            Ok(Some((custom_id, next_messages)))
        }
        JobOutcome::FinalContent { content } => {
            hooks.process_final_result(&custom_id, &content, &ctx).await?;
            Ok(None)
        }
        JobOutcome::Error { message } => {
            tracing::warn!(job = %custom_id, error = %message, "batch engine: job returned an error outcome");
            Ok(None)
        }
    }
}
