use serde::{Deserialize, Serialize};

pub const SOURCES_PLACEHOLDER: &str = "sources placeholders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    Text,
    Vectors,
    #[default]
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Text => "text",
            RetrievalMode::Vectors => "vectors",
            RetrievalMode::Hybrid => "hybrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(RetrievalMode::Text),
            "vectors" => Some(RetrievalMode::Vectors),
            "hybrid" => Some(RetrievalMode::Hybrid),
            _ => None,
        }
    }

    pub fn uses_vectors(&self) -> bool {
        !matches!(self, RetrievalMode::Text)
    }

    pub fn uses_text(&self) -> bool {
        !matches!(self, RetrievalMode::Vectors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagOptions {
    pub top: usize,
    pub retrieval_mode: RetrievalMode,
    pub semantic_ranker: bool,
    pub semantic_captions: bool,
    pub exclude_category: Option<String>,
    pub suggest_followup_questions: bool,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            top: 3,
            retrieval_mode: RetrievalMode::Hybrid,
            semantic_ranker: true,
            semantic_captions: false,
            exclude_category: None,
            suggest_followup_questions: false,
        }
    }
}

impl RagOptions {
    pub fn filter(&self) -> Option<String> {
        self.exclude_category
            .as_ref()
            .map(|c| format!("category ne '{}'", c.replace('\'', "''")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    pub source_name: String,
    pub source_content: String,
}

impl ContentSource {
    pub fn new(source_name: impl Into<String>, source_content: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source_content: source_content.into(),
        }
    }

    pub fn render(&self) -> String {
        let flattened = self
            .source_content
            .split(['\r', '\n'])
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}: {}", self.source_name, flattened)
    }
}

pub fn render_sources(sources: &[ContentSource]) -> String {
    sources
        .iter()
        .map(ContentSource::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagResponse {
    pub question: String,
    pub prompt: String,
    pub answer: String,
    pub sources_as_text: String,
}
