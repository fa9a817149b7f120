use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApproachError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("planning failed: {0}")]
    Planning(String),

    #[error("step {step} ({capability}) failed: {reason}")]
    Execution {
        step: usize,
        capability: String,
        reason: String,
    },

    #[error("retrieval failed at step {step}: {source}")]
    Retrieval {
        step: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ApproachError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApproachError::Configuration(_) => "configuration",
            ApproachError::Planning(_) => "planning",
            ApproachError::Execution { .. } => "execution",
            ApproachError::Retrieval { .. } => "retrieval",
            ApproachError::UnsupportedOperation(_) => "unsupported_operation",
        }
    }
}

pub type ApproachResult<T> = std::result::Result<T, ApproachError>;
