#![cfg(test)]

use std::sync::Arc;
use vantage_bag::SharedBag;
use vantage_tools::ToolContext;

pub fn test_context() -> ToolContext {
    ToolContext {
        run_id: "test-run".to_string(),
        bag: Arc::new(SharedBag::new()),
        cancel: tokio_util::sync::CancellationToken::new(),
    }
}
