//! Run-scoped context threaded through the batch driver, hooks, and tool
//! dispatch. See spec §5.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vantage_bag::SharedBag;

#[derive(Clone)]
pub struct BatchContext {
    pub run_id: String,
    pub bag: Arc<SharedBag>,
    pub cancel: CancellationToken,
}

impl BatchContext {
    pub fn new(run_id: impl Into<String>, bag: Arc<SharedBag>, cancel: CancellationToken) -> Self {
        Self {
            run_id: run_id.into(),
            bag,
            cancel,
        }
    }
}
