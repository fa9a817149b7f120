use crate::capabilities::{CapabilityArgs, CapabilityError};
use crate::error::{ApproachError, ApproachResult};
use crate::planner::{BindingSource, Plan, PlanStep};

use super::context::ExecutionContext;

// Steps run in declared order, each awaited before the next starts.
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    label: String,
}

impl PlanExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub async fn execute(&self, plan: &Plan, question: &str) -> ApproachResult<ExecutionContext> {
        let mut context = ExecutionContext::new(question);

        for (index, step) in plan.steps.iter().enumerate() {
            let number = index + 1;
            let capability = step.capability.qualified_name();
            let args = resolve_arguments(step, &context).map_err(|reason| {
                ApproachError::Execution {
                    step: number,
                    capability: capability.clone(),
                    reason,
                }
            })?;

            log::debug!("[{}] step {} {} starting", self.label, number, capability);

            let output = match step.capability.invoke(&args).await {
                Ok(Some(output)) => output,
                Ok(None) => {
                    log::warn!("[{}] step {} {} returned nothing", self.label, number, capability);
                    return Err(ApproachError::Execution {
                        step: number,
                        capability,
                        reason: "capability returned no result".to_string(),
                    });
                }
                Err(CapabilityError::Retrieval(source)) => {
                    log::warn!("[{}] step {} {} failed: {}", self.label, number, capability, source);
                    return Err(ApproachError::Retrieval {
                        step: number,
                        source,
                    });
                }
                Err(e) => {
                    log::warn!("[{}] step {} {} failed: {}", self.label, number, capability, e);
                    return Err(ApproachError::Execution {
                        step: number,
                        capability,
                        reason: e.to_string(),
                    });
                }
            };

            for (name, value) in output.variables {
                context.set(&name, value);
            }
            if let Some(variable) = &step.output {
                context.set(variable, output.value.clone());
            }
            context.set_result(output.value);

            log::debug!("[{}] step {} {} finished", self.label, number, capability);
        }

        Ok(context)
    }
}

fn resolve_arguments(step: &PlanStep, context: &ExecutionContext) -> Result<CapabilityArgs, String> {
    let mut args = CapabilityArgs::new();

    for parameter in step.capability.parameters() {
        let value = match step.binding(&parameter.name).map(|b| &b.source) {
            Some(BindingSource::Variable(name)) => Some(
                context
                    .get(name)
                    .ok_or_else(|| format!("variable ${} is not set", name))?
                    .to_string(),
            ),
            Some(BindingSource::Literal(value)) => Some(value.clone()),
            None if parameter.name.eq_ignore_ascii_case("input") => {
                Some(context.result().to_string())
            }
            None => context.get(&parameter.name).map(str::to_string),
        };

        match value {
            Some(value) => {
                args.insert(parameter.name.clone(), value);
            }
            None if parameter.default_value.is_some() => {}
            None => return Err(format!("no value for parameter '{}'", parameter.name)),
        }
    }

    Ok(args)
}
