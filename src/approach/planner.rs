use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use uuid::Uuid;

use super::RagApproach;
use crate::capabilities::search::SOURCES_VARIABLE;
use crate::capabilities::{build_registry, Providers};
use crate::config::Config;
use crate::engine::PlanExecutor;
use crate::error::{ApproachError, ApproachResult};
use crate::planner::{Plan, PlannerSettings, SequentialPlanner};
use crate::providers::embedding::{EmbeddingProvider, OpenAIEmbeddingProvider};
use crate::providers::llm::OpenAIProvider;
use crate::providers::search::AzureSearchProvider;
use crate::templates::TemplateLibrary;
use crate::types::{RagOptions, RagResponse, SOURCES_PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    BuildingRegistry,
    Planning,
    Executing,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::BuildingRegistry => "building_registry",
            RunState::Planning => "planning",
            RunState::Executing => "executing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

pub struct PlannerApproach {
    providers: Providers,
    templates: TemplateLibrary,
    goal: String,
    planner_settings: PlannerSettings,
}

impl PlannerApproach {
    pub fn new(
        providers: Providers,
        templates: TemplateLibrary,
        goal: impl Into<String>,
    ) -> ApproachResult<Self> {
        let goal = goal.into();
        if goal.trim().is_empty() {
            return Err(ApproachError::Configuration(
                "goal must not be empty".to_string(),
            ));
        }

        Ok(Self {
            providers,
            templates,
            goal,
            planner_settings: PlannerSettings::default(),
        })
    }

    pub fn with_planner_settings(mut self, settings: PlannerSettings) -> Self {
        self.planner_settings = settings;
        self
    }

    pub fn from_config(config: &Config) -> ApproachResult<Self> {
        if config.chat_deployment.trim().is_empty() {
            return Err(ApproachError::Configuration(
                "chat_deployment must name a model deployment".to_string(),
            ));
        }
        let api_key = required(&config.openai_api_key, "openai_api_key")?;
        let endpoint = required(&config.search_endpoint, "search_endpoint")?;
        let search_key = required(&config.search_api_key, "search_api_key")?;
        let index = required(&config.search_index, "search_index")?;

        let llm = OpenAIProvider::new(api_key.clone())
            .with_base_url(config.openai_base_url.clone())
            .with_model(config.chat_deployment.clone());
        let embedding: Arc<dyn EmbeddingProvider> = Arc::new(
            OpenAIEmbeddingProvider::new(api_key)
                .with_base_url(config.openai_base_url.clone())
                .with_model(config.embedding_deployment.clone()),
        );

        let providers = Providers {
            llm: Arc::new(llm),
            search: Arc::new(AzureSearchProvider::new(endpoint, index, search_key)),
            embedding: Some(embedding),
        };

        Self::new(
            providers,
            TemplateLibrary::from_config(config.templates_dir.as_deref()),
            config.goal.clone(),
        )
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub async fn plan(&self, options: &RagOptions) -> ApproachResult<Plan> {
        let registry = build_registry(options, &self.providers, &self.templates)?;
        let planner =
            SequentialPlanner::new(self.providers.llm.clone(), self.planner_settings.clone());
        planner.create_plan(&self.goal, &registry).await
    }

    async fn run_states(
        &self,
        run_id: &str,
        question: &str,
        options: &RagOptions,
        state: &mut RunState,
    ) -> ApproachResult<RagResponse> {
        *state = RunState::BuildingRegistry;
        let registry = build_registry(options, &self.providers, &self.templates)?;
        log::debug!("[{}] registry built with {:?}", run_id, registry.capability_names());

        *state = RunState::Planning;
        let planner =
            SequentialPlanner::new(self.providers.llm.clone(), self.planner_settings.clone());
        let plan = planner.create_plan(&self.goal, &registry).await?;
        let plan_string = plan.to_plan_string();
        log::debug!("[{}] plan calculated is [{}]", run_id, plan_string);

        *state = RunState::Executing;
        let context = PlanExecutor::new()
            .with_label(run_id)
            .execute(&plan, question)
            .await?;

        if context.result().trim().is_empty() {
            return Err(ApproachError::Execution {
                step: plan.len(),
                capability: plan.capability_names().pop().unwrap_or_default(),
                reason: "plan produced an empty answer".to_string(),
            });
        }

        *state = RunState::Done;
        Ok(RagResponse {
            question: question.to_string(),
            prompt: plan_string,
            answer: context.result().to_string(),
            sources_as_text: context
                .get(SOURCES_VARIABLE)
                .unwrap_or(SOURCES_PLACEHOLDER)
                .to_string(),
        })
    }
}

fn required(value: &Option<String>, key: &str) -> ApproachResult<String> {
    value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ApproachError::Configuration(format!("{} is not configured", key)))
}

#[async_trait]
impl RagApproach for PlannerApproach {
    async fn run(&self, question: &str, options: &RagOptions) -> ApproachResult<RagResponse> {
        let run_id = Uuid::new_v4().to_string();
        let mut state = RunState::BuildingRegistry;

        match self.run_states(&run_id, question, options, &mut state).await {
            Ok(response) => {
                log::info!("[{}] answered question in state {}", run_id, state.as_str());
                Ok(response)
            }
            Err(e) => {
                log::warn!(
                    "[{}] {} -> {}: {}",
                    run_id,
                    state.as_str(),
                    RunState::Failed.as_str(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run_streaming(
        &self,
        _question: &str,
        _options: &RagOptions,
        _sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> ApproachResult<()> {
        Err(ApproachError::UnsupportedOperation(
            "Streaming not supported for this approach".to_string(),
        ))
    }
}
