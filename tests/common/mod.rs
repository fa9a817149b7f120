#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ragplan::capabilities::Providers;
use ragplan::providers::{
    CompletionSettings, EmbeddingProvider, LLMProvider, Message, SearchProvider,
};
use ragplan::{ContentSource, RagOptions};

pub const TWO_STEP_PLAN: &str = r#"<plan>
  <function.InformationFinder.Search input="$INPUT" setContextVariable="sources"/>
  <function.RAG.AnswerQuestion input="$INPUT" sources="$sources"/>
</plan>"#;

pub struct ScriptedLLM {
    plan: String,
    answer: Result<String, String>,
    pub planning_calls: AtomicUsize,
    pub completion_calls: AtomicUsize,
    pub planning_prompts: Mutex<Vec<String>>,
    pub completion_prompts: Mutex<Vec<String>>,
}

impl ScriptedLLM {
    pub fn new(plan: &str, answer: &str) -> Arc<Self> {
        Self::build(plan, Ok(answer.to_string()))
    }

    pub fn failing_completion(plan: &str) -> Arc<Self> {
        Self::build(plan, Err("model overloaded".to_string()))
    }

    fn build(plan: &str, answer: Result<String, String>) -> Arc<Self> {
        Arc::new(Self {
            plan: plan.to_string(),
            answer,
            planning_calls: AtomicUsize::new(0),
            completion_calls: AtomicUsize::new(0),
            planning_prompts: Mutex::new(vec![]),
            completion_prompts: Mutex::new(vec![]),
        })
    }

    pub fn planning_calls(&self) -> usize {
        self.planning_calls.load(Ordering::SeqCst)
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedLLM {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _settings: CompletionSettings,
    ) -> Result<String> {
        let transcript = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if transcript.contains("[AVAILABLE FUNCTIONS]") {
            self.planning_calls.fetch_add(1, Ordering::SeqCst);
            self.planning_prompts.lock().unwrap().push(transcript);
            return Ok(self.plan.clone());
        }

        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.completion_prompts.lock().unwrap().push(transcript);
        match &self.answer {
            Ok(answer) => Ok(answer.clone()),
            Err(e) => anyhow::bail!("{}", e),
        }
    }
}

pub struct CountingSearch {
    sources: Option<Vec<ContentSource>>,
    pub calls: AtomicUsize,
    pub saw_embedding: AtomicUsize,
}

impl CountingSearch {
    pub fn new(sources: Vec<ContentSource>) -> Arc<Self> {
        Arc::new(Self {
            sources: Some(sources),
            calls: AtomicUsize::new(0),
            saw_embedding: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sources: None,
            calls: AtomicUsize::new(0),
            saw_embedding: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    async fn search(
        &self,
        _query: &str,
        embedding: Option<&[f32]>,
        options: &RagOptions,
    ) -> Result<Vec<ContentSource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if embedding.is_some() {
            self.saw_embedding.fetch_add(1, Ordering::SeqCst);
        }
        match &self.sources {
            Some(sources) => Ok(sources.iter().take(options.top).cloned().collect()),
            None => anyhow::bail!("search service unavailable"),
        }
    }
}

pub struct CountingEmbedding {
    pub calls: AtomicUsize,
}

impl CountingEmbedding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.1, 0.2, 0.3])
    }
}

pub fn stadium_source() -> ContentSource {
    ContentSource::new("stadium-x.pdf#page=4", "Stadium X seats 42,000 spectators.")
}

pub fn providers(
    llm: &Arc<ScriptedLLM>,
    search: &Arc<CountingSearch>,
    embedding: Option<&Arc<CountingEmbedding>>,
) -> Providers {
    Providers {
        llm: llm.clone(),
        search: search.clone(),
        embedding: embedding.map(|e| e.clone() as Arc<dyn EmbeddingProvider>),
    }
}

pub fn text_options() -> RagOptions {
    RagOptions {
        retrieval_mode: ragplan::RetrievalMode::Text,
        ..Default::default()
    }
}
