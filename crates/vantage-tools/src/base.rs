use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vantage_bag::SharedBag;

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Context threaded through every decorator layer and into the raw tool.
/// Carries the run identity (for I/O persistence paths), the shared bag all
/// decorators report into, and a cancellation token every suspension point
/// must honor (spec §5).
#[derive(Clone)]
pub struct ToolContext {
    pub run_id: String,
    pub bag: Arc<SharedBag>,
    pub cancel: CancellationToken,
}

/// An invocable unit with a unique key, JSON-schema parameters, and a
/// `run` operation. See spec §3.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn key(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;

    fn tags(&self) -> &[String] {
        &[]
    }

    /// Whether this tool talks to a system outside the process.
    fn external(&self) -> bool {
        true
    }

    /// Whether this tool's results may be cached (spec §4.B.2). Only
    /// side-effect-free tools should return `true`.
    fn cacheable(&self) -> bool {
        false
    }

    /// Execute the tool. `args` is a JSON-encoded argument string (spec §3:
    /// "Inputs are JSON-encoded argument strings"); the return value is a
    /// string, JSON where applicable.
    async fn run(&self, ctx: &ToolContext, args: &str) -> anyhow::Result<String>;

    /// JSON-schema function descriptor handed to the LLM (spec §6).
    fn to_schema(&self) -> Value {
        let params = self.parameters();
        let required: Vec<Value> = params["properties"]
            .as_object()
            .map(|props| props.keys().cloned().map(Value::String).collect())
            .unwrap_or_default();
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.key(),
                "description": self.description(),
                "parameters": {
                    "type": "object",
                    "properties": params["properties"].clone(),
                    "required": required,
                    "additionalProperties": false,
                }
            }
        })
    }
}
