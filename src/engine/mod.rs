pub mod context;
pub mod executor;

pub use context::{ExecutionContext, INPUT_VARIABLE};
pub use executor::PlanExecutor;
