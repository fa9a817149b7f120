pub mod answer_question;
pub mod registry;
pub mod search;

pub use answer_question::AnswerQuestionCapability;
pub use registry::{build_registry, CapabilityRegistry};
pub use search::SearchCapability;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::providers::embedding::EmbeddingProvider;
use crate::providers::llm::LLMProvider;
use crate::providers::search::SearchProvider;
use crate::templates::TemplateError;

pub const INFORMATION_FINDER_GROUP: &str = "InformationFinder";
pub const RAG_GROUP: &str = "RAG";
pub const SEARCH_CAPABILITY: &str = "Search";
pub const ANSWER_QUESTION_CAPABILITY: &str = "AnswerQuestion";

#[derive(Clone)]
pub struct Providers {
    pub llm: Arc<dyn LLMProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub embedding: Option<Arc<dyn EmbeddingProvider>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub default_value: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_value: None,
        }
    }
}

pub type CapabilityArgs = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutput {
    pub value: String,
    pub variables: Vec<(String, String)>,
}

impl CapabilityOutput {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            variables: vec![],
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),
    #[error("completion failed: {0}")]
    Completion(#[source] anyhow::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("missing input '{0}'")]
    MissingInput(String),
}

/// `invoke` returns `Ok(None)` when the call succeeded but produced nothing usable.
#[async_trait]
pub trait Capability: Send + Sync {
    fn group(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> &[ParameterSpec];
    fn returns(&self) -> &str;

    async fn invoke(&self, args: &CapabilityArgs) -> Result<Option<CapabilityOutput>, CapabilityError>;

    fn qualified_name(&self) -> String {
        format!("{}.{}", self.group(), self.name())
    }

    fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

fn required_arg<'a>(args: &'a CapabilityArgs, name: &str) -> Result<&'a str, CapabilityError> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| CapabilityError::MissingInput(name.to_string()))
}
