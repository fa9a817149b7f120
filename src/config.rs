use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GOAL: &str =
    "Take the input as a question and answer it finding any information needed";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub search_index: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub goal: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_deployment: "gpt-4o-mini".to_string(),
            embedding_deployment: "text-embedding-3-small".to_string(),
            search_endpoint: None,
            search_api_key: None,
            search_index: None,
            templates_dir: None,
            goal: DEFAULT_GOAL.to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env())
    }

    fn with_env(mut self) -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        if let Some(v) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = var("OPENAI_BASE_URL") {
            self.openai_base_url = v;
        }
        if let Some(v) = var("OPENAI_CHATGPT_DEPLOYMENT") {
            self.chat_deployment = v;
        }
        if let Some(v) = var("OPENAI_EMBEDDING_DEPLOYMENT") {
            self.embedding_deployment = v;
        }
        if let Some(v) = var("AZURE_SEARCH_ENDPOINT") {
            self.search_endpoint = Some(v);
        }
        if let Some(v) = var("AZURE_SEARCH_API_KEY") {
            self.search_api_key = Some(v);
        }
        if let Some(v) = var("AZURE_SEARCH_INDEX") {
            self.search_index = Some(v);
        }
        if let Some(v) = var("RAGPLAN_TEMPLATES_DIR") {
            self.templates_dir = Some(PathBuf::from(v));
        }
        self
    }
}
