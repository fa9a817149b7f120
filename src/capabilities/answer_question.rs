use async_trait::async_trait;
use std::sync::Arc;

use super::{Capability, CapabilityArgs, CapabilityError, CapabilityOutput, ParameterSpec};
use crate::providers::llm::{LLMProvider, Message};
use crate::templates::PromptTemplate;

pub struct AnswerQuestionCapability {
    template: PromptTemplate,
    llm: Arc<dyn LLMProvider>,
    parameters: Vec<ParameterSpec>,
}

impl AnswerQuestionCapability {
    pub fn new(template: PromptTemplate, llm: Arc<dyn LLMProvider>) -> Self {
        let parameters = template
            .parameters
            .iter()
            .map(|p| ParameterSpec {
                name: p.name.clone(),
                description: p.description.clone(),
                default_value: p.default_value.clone(),
            })
            .collect();

        Self {
            template,
            llm,
            parameters,
        }
    }
}

#[async_trait]
impl Capability for AnswerQuestionCapability {
    fn group(&self) -> &str {
        &self.template.group
    }

    fn name(&self) -> &str {
        &self.template.name
    }

    fn description(&self) -> &str {
        &self.template.description
    }

    fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    fn returns(&self) -> &str {
        &self.template.returns
    }

    async fn invoke(
        &self,
        args: &CapabilityArgs,
    ) -> Result<Option<CapabilityOutput>, CapabilityError> {
        let prompt = self.template.render(args)?;

        let answer = self
            .llm
            .complete(vec![Message::user(prompt)], self.template.completion)
            .await
            .map_err(CapabilityError::Completion)?;

        if answer.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(CapabilityOutput::text(answer)))
    }
}
