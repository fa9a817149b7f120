use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

use super::{parse_plan, Plan};
use crate::capabilities::{Capability, CapabilityRegistry};
use crate::error::{ApproachError, ApproachResult};
use crate::providers::llm::{CompletionSettings, LLMProvider, Message};

const PLANNER_SYSTEM_PROMPT: &str = r#"You are a planner. Create an XML plan that satisfies the goal using only the functions listed under [AVAILABLE FUNCTIONS].

Rules:
1) The plan is a single <plan> element holding one <function.Group.Name/> element per step, in execution order.
2) Pass inputs as attributes named after the function inputs. A value that starts with $ reads a context variable; $INPUT is the original input. Any other value is a literal.
3) Add setContextVariable="NAME" to store a step result in a variable that later steps can read as $NAME.
4) Only use functions and inputs that are listed. Never invent new ones.
5) Return the XML plan only, with no explanation."#;

const PLAN_EXAMPLE: &str = r#"<plan>
  <function.Group.First input="$INPUT" setContextVariable="FIRST_RESULT"/>
  <function.Group.Second input="$INPUT" other="$FIRST_RESULT"/>
</plan>"#;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub temperature: f32,
    pub max_relevant_capabilities: usize,
    pub excluded_groups: BTreeSet<String>,
    pub excluded_capabilities: BTreeSet<String>,
    pub included_capabilities: BTreeSet<String>,
    pub max_tokens: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_relevant_capabilities: 100,
            excluded_groups: BTreeSet::new(),
            excluded_capabilities: BTreeSet::new(),
            included_capabilities: BTreeSet::new(),
            max_tokens: 1024,
        }
    }
}

impl PlannerSettings {
    fn completion(&self) -> CompletionSettings {
        CompletionSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn is_excluded(&self, capability: &Arc<dyn Capability>) -> bool {
        contains_ignore_case(&self.excluded_groups, capability.group())
            || contains_ignore_case(&self.excluded_capabilities, &capability.qualified_name())
    }

    fn is_included(&self, capability: &Arc<dyn Capability>) -> bool {
        contains_ignore_case(&self.included_capabilities, &capability.qualified_name())
    }
}

fn contains_ignore_case(set: &BTreeSet<String>, value: &str) -> bool {
    set.iter().any(|entry| entry.eq_ignore_ascii_case(value))
}

pub struct SequentialPlanner {
    llm: Arc<dyn LLMProvider>,
    settings: PlannerSettings,
}

impl SequentialPlanner {
    pub fn new(llm: Arc<dyn LLMProvider>, settings: PlannerSettings) -> Self {
        Self { llm, settings }
    }

    pub fn available_capabilities(&self, registry: &CapabilityRegistry) -> CapabilityRegistry {
        let included = registry.iter().filter(|c| self.settings.is_included(c));
        let remaining = registry
            .iter()
            .filter(|c| !self.settings.is_included(c) && !self.settings.is_excluded(c));

        let mut available = CapabilityRegistry::new();
        for capability in included
            .chain(remaining)
            .take(self.settings.max_relevant_capabilities)
        {
            available.register(capability.clone());
        }
        available
    }

    pub async fn create_plan(
        &self,
        goal: &str,
        registry: &CapabilityRegistry,
    ) -> ApproachResult<Plan> {
        let available = self.available_capabilities(registry);
        if available.is_empty() {
            return Err(ApproachError::Planning(
                "no capabilities available to the planner".to_string(),
            ));
        }

        let messages = vec![
            Message::system(build_system_prompt(&available)),
            Message::user(format!("Goal: {}\n\nPlan:", goal.trim())),
        ];

        let response = self
            .llm
            .complete(messages, self.settings.completion())
            .await
            .map_err(|e| ApproachError::Planning(format!("planner request failed: {}", e)))?;

        if response.trim().is_empty() {
            return Err(ApproachError::Planning(
                "planner returned an empty response".to_string(),
            ));
        }

        parse_plan(goal, &response, &available)
    }
}

fn build_system_prompt(available: &CapabilityRegistry) -> String {
    let mut prompt = String::from(PLANNER_SYSTEM_PROMPT);
    prompt.push_str("\n\nExample:\n");
    prompt.push_str(PLAN_EXAMPLE);
    prompt.push_str("\n\n[AVAILABLE FUNCTIONS]\n");
    prompt.push_str(&describe_capabilities(available));
    prompt.push_str("[END AVAILABLE FUNCTIONS]\n");
    prompt
}

pub fn describe_capabilities(registry: &CapabilityRegistry) -> String {
    let mut out = String::new();
    for capability in registry.iter() {
        let _ = writeln!(out, "{}:", capability.qualified_name());
        let _ = writeln!(out, "  description: {}", capability.description());
        let _ = writeln!(out, "  inputs:");
        for parameter in capability.parameters() {
            let _ = write!(out, "    - {}: {}", parameter.name, parameter.description);
            if let Some(default) = &parameter.default_value {
                let _ = write!(out, " (default: {:?})", default);
            }
            out.push('\n');
        }
        let _ = writeln!(out, "  returns: {}", capability.returns());
        out.push('\n');
    }
    out
}
