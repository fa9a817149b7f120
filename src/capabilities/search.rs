use async_trait::async_trait;
use std::sync::Arc;

use super::{
    required_arg, Capability, CapabilityArgs, CapabilityError, CapabilityOutput, ParameterSpec,
    INFORMATION_FINDER_GROUP, SEARCH_CAPABILITY,
};
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::search::SearchProvider;
use crate::types::{render_sources, RagOptions};

pub const SOURCES_VARIABLE: &str = "sources";

pub struct SearchCapability {
    search: Arc<dyn SearchProvider>,
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    options: RagOptions,
    parameters: Vec<ParameterSpec>,
}

impl SearchCapability {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        embedding: Option<Arc<dyn EmbeddingProvider>>,
        options: RagOptions,
    ) -> Self {
        Self {
            search,
            embedding,
            options,
            parameters: vec![ParameterSpec::new(
                "input",
                "The question or keywords to search information for",
            )],
        }
    }
}

#[async_trait]
impl Capability for SearchCapability {
    fn group(&self) -> &str {
        INFORMATION_FINDER_GROUP
    }

    fn name(&self) -> &str {
        SEARCH_CAPABILITY
    }

    fn description(&self) -> &str {
        "Search the knowledge base for information relevant to the input. Returns ranked source snippets."
    }

    fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    fn returns(&self) -> &str {
        "Source snippets, one per line, formatted as 'source name: content'"
    }

    async fn invoke(
        &self,
        args: &CapabilityArgs,
    ) -> Result<Option<CapabilityOutput>, CapabilityError> {
        let query = required_arg(args, "input")?;

        let embedding = if self.options.retrieval_mode.uses_vectors() {
            let provider = self.embedding.as_ref().ok_or_else(|| {
                CapabilityError::Retrieval(anyhow::anyhow!(
                    "Embedding provider not configured for {} retrieval",
                    self.options.retrieval_mode.as_str()
                ))
            })?;
            Some(provider.embed(query).await.map_err(CapabilityError::Retrieval)?)
        } else {
            None
        };

        let sources = self
            .search
            .search(query, embedding.as_deref(), &self.options)
            .await
            .map_err(CapabilityError::Retrieval)?;

        log::debug!("Search for [{}] returned {} sources", query, sources.len());

        let text = render_sources(&sources);
        Ok(Some(
            CapabilityOutput::text(text.clone()).with_variable(SOURCES_VARIABLE, text),
        ))
    }
}
