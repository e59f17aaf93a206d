#![allow(dead_code)]

use thiserror::Error;

/// Typed error hierarchy for the orchestrator (spec §7).
///
/// Use at module boundaries (engine execution, tool invocation, config
/// loading, the pipeline itself). Leaf/internal functions continue to
/// return `anyhow::Result` — `Internal` lets `?` convert seamlessly.
#[derive(Debug, Error)]
pub enum VantageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("initialization error at step {step}: {message}")]
    Init { step: usize, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("tool invocation error: {tool}: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("normalization error: {tool}: {message}")]
    Normalization { tool: String, message: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("rate limit cancelled")]
    RateLimit,

    #[error("hook error in engine '{engine}', iteration {iteration}: {message}")]
    Hook {
        engine: String,
        iteration: usize,
        message: String,
    },

    #[error("validation error: engine '{engine}' did not produce result key '{result_key}'")]
    Validation { engine: String, result_key: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type VantageResult<T> = std::result::Result<T, VantageError>;

impl VantageError {
    /// Whether a caller's retry policy should consider this transient.
    /// `ToolInvocation` and `Normalization` are deliberately excluded: they
    /// are recoverable by the engine itself (surfaced to the next LLM turn
    /// or recorded and ignored), not by a caller-level retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VantageError::Transport(_) | VantageError::RateLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = VantageError::Config("missing data_dir".into());
        assert_eq!(err.to_string(), "configuration error: missing data_dir");
    }

    #[test]
    fn init_error_carries_step_index() {
        let err = VantageError::Init {
            step: 2,
            message: "profile load failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "initialization error at step 2: profile load failed"
        );
    }

    #[test]
    fn transport_and_rate_limit_are_retryable() {
        assert!(VantageError::Transport("timeout".into()).is_retryable());
        assert!(VantageError::RateLimit.is_retryable());
    }

    #[test]
    fn tool_invocation_is_not_retryable() {
        let err = VantageError::ToolInvocation {
            tool: "news_search".into(),
            message: "HTTP 500".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn internal_from_anyhow() {
        let err: VantageError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, VantageError::Internal(_)));
        assert!(!err.is_retryable());
    }
}
