//! A bounded synchronous tool-call loop for interactive mode (spec §2:
//! "interactive engines skip D and loop tool calls synchronously via a
//! run-loop collaborator"). Dispatches through the same decorated Tool
//! Manager batch engines use, for feature parity between the two modes
//! (`SPEC_FULL.md` §6).

use crate::collaborators::{AgentSpec, InteractiveClient};
use crate::engines::Engine;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vantage_bag::Key;
use vantage_batch::BatchContext;
use vantage_tools::ToolManager;

pub const DEFAULT_MAX_TURNS: usize = 20;

pub struct InteractiveEngine {
    client: Arc<dyn InteractiveClient>,
    tools: Arc<ToolManager>,
    agent_name: String,
    model: String,
    initial_input: String,
    result_key: Key,
    max_turns: usize,
}

impl InteractiveEngine {
    pub fn new(
        client: Arc<dyn InteractiveClient>,
        tools: Arc<ToolManager>,
        agent_name: impl Into<String>,
        model: impl Into<String>,
        initial_input: impl Into<String>,
        result_key: Key,
    ) -> Self {
        Self {
            client,
            tools,
            agent_name: agent_name.into(),
            model: model.into(),
            initial_input: initial_input.into(),
            result_key,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// A `new_items` entry the client didn't resolve itself: `{"type":
    /// "tool_call", "id", "name", "arguments"}`. Anything else (assistant
    /// text, handoffs) is left untouched — the loop just keeps running
    /// until no unresolved tool call remains or `max_turns` is hit.
    fn pending_tool_calls(items: &[Value]) -> Vec<&Value> {
        items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("tool_call"))
            .collect()
    }

    async fn dispatch(&self, call: &Value, ctx: &BatchContext) -> Value {
        let id = call.get("id").and_then(Value::as_str).unwrap_or_default();
        let name = call.get("name").and_then(Value::as_str).unwrap_or_default();
        let arguments = call
            .get("arguments")
            .and_then(Value::as_str)
            .unwrap_or("{}");

        let content = match self.tools.get(name) {
            Some(tool) => {
                let tool_ctx = vantage_tools::ToolContext {
                    run_id: ctx.run_id.clone(),
                    bag: ctx.bag.clone(),
                    cancel: ctx.cancel.clone(),
                };
                match tool.run(&tool_ctx, arguments).await {
                    Ok(result) => result,
                    Err(err) => format!("error: {err}"),
                }
            }
            None => format!("error: unknown tool '{name}'"),
        };

        serde_json::json!({"type": "tool_result", "tool_call_id": id, "content": content})
    }
}

#[async_trait]
impl Engine for InteractiveEngine {
    fn name(&self) -> &str {
        "interactive"
    }

    fn result_key(&self) -> Key {
        self.result_key
    }

    async fn execute(&self, ctx: &BatchContext) -> anyhow::Result<()> {
        let mut input = self.initial_input.clone();
        let mut turn = 0usize;

        loop {
            if ctx.cancel.is_cancelled() {
                anyhow::bail!("interactive engine: cancelled at turn {turn}");
            }

            let spec = AgentSpec {
                name: self.agent_name.clone(),
                model: self.model.clone(),
                tools: self.tools.definitions(),
            };
            let result = self.client.run(spec, &input, ctx.cancel.clone()).await?;

            let pending = Self::pending_tool_calls(&result.new_items);
            if pending.is_empty() || turn + 1 >= self.max_turns {
                ctx.bag.set(self.result_key, &result.final_output);
                return Ok(());
            }

            let mut resolved = Vec::with_capacity(pending.len());
            for call in pending {
                resolved.push(self.dispatch(call, ctx).await);
            }
            input = serde_json::json!({"previous_input": input, "tool_results": resolved}).to_string();
            turn += 1;
        }
    }
}
