//! The two batch engines (risk analysis, investment research) plus the
//! interactive engine (spec §2: "interactive engines skip D and loop tool
//! calls synchronously"). Each is thin — the hook bodies build/parse prompts
//! and write results into the bag; the batch driver (`vantage_batch`) does
//! the rest.

mod interactive;
mod investment_research;
mod risk;

pub use interactive::InteractiveEngine;
pub use investment_research::InvestmentResearchEngine;
pub use risk::RiskAnalysisEngine;

use async_trait::async_trait;
use vantage_bag::Key;
use vantage_batch::BatchContext;

#[async_trait]
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;
    fn result_key(&self) -> Key;
    async fn execute(&self, ctx: &BatchContext) -> anyhow::Result<()>;
}
