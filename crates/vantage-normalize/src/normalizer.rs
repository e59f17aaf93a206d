use crate::envelope::NormalizationEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a normalization attempt. See spec §4.B.4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalizeStatus {
    Ok,
    /// The payload parsed but carried no usable rows (e.g. a provider
    /// returned all-null columns). `reason` is a short machine-readable tag
    /// such as `provider_null_series`.
    Empty { reason: String },
    /// No normalizer matched, or the payload wasn't JSON at all.
    Error { message: String },
}

/// Converts a provider-specific tool output into a [`NormalizationEnvelope`].
/// Implementations are tried in registration order; the first whose `can`
/// returns `true` for the tool name wins (spec §4.B.4: "first `can(toolName)`
/// match wins").
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &str;

    fn can(&self, tool_name: &str) -> bool;

    /// `raw_result` is the tool's raw string output (JSON where applicable).
    /// `received_at` is the decorator's receipt timestamp, used as a
    /// parse-failure fallback for timestamped fields (e.g. news
    /// `published_at`).
    fn normalize(
        &self,
        tool_name: &str,
        provider: &str,
        args: &Value,
        raw_result: &str,
        received_at: chrono::DateTime<chrono::Utc>,
    ) -> (Option<NormalizationEnvelope>, NormalizeStatus);
}

/// Ordered collection of normalizers, selected by tool name.
#[derive(Default)]
pub struct NormalizerRegistry {
    normalizers: Vec<Box<dyn Normalizer>>,
}

impl NormalizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, normalizer: Box<dyn Normalizer>) {
        self.normalizers.push(normalizer);
    }

    pub fn find(&self, tool_name: &str) -> Option<&dyn Normalizer> {
        self.normalizers
            .iter()
            .map(std::convert::AsRef::as_ref)
            .find(|n| n.can(tool_name))
    }

    /// Normalize `raw_result` for `tool_name`. If no normalizer matches, or
    /// the payload is not JSON, returns `Error` with an explanatory message —
    /// the caller (the normalize decorator) still records this outcome and
    /// passes the original tool result through untouched.
    pub fn normalize(
        &self,
        tool_name: &str,
        provider: &str,
        args: &Value,
        raw_result: &str,
        received_at: chrono::DateTime<chrono::Utc>,
    ) -> (Option<NormalizationEnvelope>, NormalizeStatus) {
        match self.find(tool_name) {
            Some(normalizer) => {
                normalizer.normalize(tool_name, provider, args, raw_result, received_at)
            }
            None => (
                None,
                NormalizeStatus::Error {
                    message: format!("no normalizer registered for tool '{tool_name}'"),
                },
            ),
        }
    }
}
