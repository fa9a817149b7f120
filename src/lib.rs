pub mod approach;
pub mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod providers;
pub mod templates;
pub mod types;

pub use approach::{PlannerApproach, RagApproach};
pub use config::Config;
pub use error::ApproachError;
pub use types::*;
