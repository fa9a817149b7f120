pub mod parser;
pub mod sequential;

pub use parser::parse_plan;
pub use sequential::{PlannerSettings, SequentialPlanner};

use std::fmt;
use std::sync::Arc;

use crate::capabilities::Capability;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSource {
    Variable(String),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub parameter: String,
    pub source: BindingSource,
}

impl fmt::Display for InputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            BindingSource::Variable(name) => write!(f, "{}=${}", self.parameter, name),
            BindingSource::Literal(value) => write!(f, "{}={:?}", self.parameter, value),
        }
    }
}

#[derive(Clone)]
pub struct PlanStep {
    pub capability: Arc<dyn Capability>,
    pub bindings: Vec<InputBinding>,
    pub output: Option<String>,
}

impl PlanStep {
    pub fn binding(&self, parameter: &str) -> Option<&InputBinding> {
        self.bindings
            .iter()
            .find(|b| b.parameter.eq_ignore_ascii_case(parameter))
    }
}

impl fmt::Debug for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanStep")
            .field("capability", &self.capability.qualified_name())
            .field("bindings", &self.bindings)
            .field("output", &self.output)
            .finish()
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.capability.qualified_name())?;
        for binding in &self.bindings {
            write!(f, " {}", binding)?;
        }
        if let Some(output) = &self.output {
            write!(f, " -> ${}", output)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub goal: String,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(goal: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            goal: goal.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn capability_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| s.capability.qualified_name())
            .collect()
    }

    pub fn to_plan_string(&self) -> String {
        let mut out = format!("Goal: {}\nSteps:", self.goal.trim());
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, step));
        }
        out
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plan_string())
    }
}
