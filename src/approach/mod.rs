pub mod planner;

pub use planner::{PlannerApproach, RunState};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::ApproachResult;
use crate::types::{RagOptions, RagResponse};

#[async_trait]
pub trait RagApproach: Send + Sync {
    async fn run(&self, question: &str, options: &RagOptions) -> ApproachResult<RagResponse>;

    async fn run_streaming(
        &self,
        question: &str,
        options: &RagOptions,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> ApproachResult<()>;
}
