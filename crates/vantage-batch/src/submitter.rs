//! Collaborator contract the batch engine submits work through. See spec §6.

use crate::job::{BatchJob, BatchResult};
use tokio_util::sync::CancellationToken;

#[async_trait::async_trait]
pub trait BatchSubmitter: Send + Sync {
    async fn submit(&self, jobs: Vec<BatchJob>) -> anyhow::Result<String>;
    async fn await_result(
        &self,
        job_id: &str,
        cancel: CancellationToken,
    ) -> anyhow::Result<BatchResult>;
}
