use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::providers::llm::CompletionSettings;

pub const PROMPT_FILE: &str = "skprompt.txt";
pub const CONFIG_FILE: &str = "config.yaml";

const BUNDLED: &[(&str, &str, &str, &str)] = &[(
    "RAG",
    "AnswerQuestion",
    include_str!("../../resources/plugins/RAG/AnswerQuestion/skprompt.txt"),
    include_str!("../../resources/plugins/RAG/AnswerQuestion/config.yaml"),
)];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template resource {group}.{name} not found in {location}")]
    NotFound {
        group: String,
        name: String,
        location: String,
    },
    #[error("template resource {resource} is invalid: {reason}")]
    Invalid { resource: String, reason: String },
    #[error("template {resource} has no value for variable '{variable}'")]
    MissingVariable { resource: String, variable: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "default")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateConfig {
    #[serde(default)]
    version: Option<String>,
    description: String,
    #[serde(default)]
    returns: Option<String>,
    #[serde(default)]
    completion: Option<CompletionSettings>,
    #[serde(default)]
    parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub group: String,
    pub name: String,
    pub version: Option<String>,
    pub description: String,
    pub returns: String,
    pub completion: CompletionSettings,
    pub parameters: Vec<TemplateParameter>,
    body: String,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*\$([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

impl PromptTemplate {
    pub fn parse(group: &str, name: &str, body: &str, config: &str) -> Result<Self, TemplateError> {
        let resource = format!("{}.{}", group, name);
        let config: TemplateConfig =
            serde_yaml::from_str(config).map_err(|e| TemplateError::Invalid {
                resource: resource.clone(),
                reason: e.to_string(),
            })?;

        if body.trim().is_empty() {
            return Err(TemplateError::Invalid {
                resource,
                reason: "prompt body is empty".to_string(),
            });
        }

        // Every placeholder must be a declared parameter.
        for caps in placeholder_pattern().captures_iter(body) {
            let var = &caps[1];
            if !config.parameters.iter().any(|p| p.name == var) {
                return Err(TemplateError::Invalid {
                    resource,
                    reason: format!("placeholder '{}' is not a declared parameter", var),
                });
            }
        }

        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            version: config.version,
            description: config.description,
            returns: config.returns.unwrap_or_else(|| "The completion text".to_string()),
            completion: config.completion.unwrap_or_default(),
            parameters: config.parameters,
            body: body.to_string(),
        })
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }

    pub fn render(&self, variables: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut missing = None;
        let rendered = placeholder_pattern().replace_all(&self.body, |caps: &regex::Captures| {
            let var = &caps[1];
            let value = variables.get(var).cloned().or_else(|| {
                self.parameters
                    .iter()
                    .find(|p| p.name == var)
                    .and_then(|p| p.default_value.clone())
            });
            match value {
                Some(value) => value,
                None => {
                    missing.get_or_insert_with(|| var.to_string());
                    String::new()
                }
            }
        });

        if let Some(variable) = missing {
            return Err(TemplateError::MissingVariable {
                resource: self.qualified_name(),
                variable,
            });
        }
        Ok(rendered.into_owned())
    }
}

#[derive(Debug, Clone, Default)]
pub enum TemplateLibrary {
    #[default]
    Bundled,
    Directory(PathBuf),
}

impl TemplateLibrary {
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        TemplateLibrary::Directory(root.into())
    }

    pub fn from_config(templates_dir: Option<&Path>) -> Self {
        match templates_dir {
            Some(dir) => Self::from_dir(dir),
            None => TemplateLibrary::Bundled,
        }
    }

    pub fn load(&self, group: &str, name: &str) -> Result<PromptTemplate, TemplateError> {
        match self {
            TemplateLibrary::Bundled => BUNDLED
                .iter()
                .find(|(g, n, _, _)| *g == group && *n == name)
                .ok_or_else(|| TemplateError::NotFound {
                    group: group.to_string(),
                    name: name.to_string(),
                    location: "bundled resources".to_string(),
                })
                .and_then(|(g, n, body, config)| PromptTemplate::parse(g, n, body, config)),
            TemplateLibrary::Directory(root) => {
                let dir = root.join(group).join(name);
                let not_found = || TemplateError::NotFound {
                    group: group.to_string(),
                    name: name.to_string(),
                    location: root.display().to_string(),
                };
                let body = std::fs::read_to_string(dir.join(PROMPT_FILE)).map_err(|_| not_found())?;
                let config = std::fs::read_to_string(dir.join(CONFIG_FILE)).map_err(|_| not_found())?;
                PromptTemplate::parse(group, name, &body, &config)
            }
        }
    }
}
