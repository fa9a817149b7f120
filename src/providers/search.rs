use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::{ContentSource, RagOptions};

const SEARCH_API_VERSION: &str = "2023-11-01";

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        embedding: Option<&[f32]>,
        options: &RagOptions,
    ) -> Result<Vec<ContentSource>>;
}

#[derive(Debug, Clone)]
pub struct AzureSearchProvider {
    endpoint: String,
    index: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AzureSearchResponse {
    #[serde(default)]
    value: Vec<AzureSearchDocument>,
}

#[derive(Debug, Deserialize)]
struct AzureSearchDocument {
    #[serde(default)]
    sourcepage: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "@search.captions", default)]
    captions: Option<Vec<AzureCaption>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AzureCaption {
    text: String,
}

impl AzureSearchProvider {
    pub fn new(endpoint: String, index: String, api_key: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, query: &str, embedding: Option<&[f32]>, options: &RagOptions) -> Value {
        let mut body = json!({
            "top": options.top,
            "select": "sourcepage,content",
        });

        if options.retrieval_mode.uses_text() {
            body["search"] = json!(query);
        }
        if let Some(filter) = options.filter() {
            body["filter"] = json!(filter);
        }
        if options.semantic_ranker && options.retrieval_mode.uses_text() {
            body["queryType"] = json!("semantic");
            body["semanticConfiguration"] = json!("default");
            if options.semantic_captions {
                body["captions"] = json!("extractive");
            }
        }
        if let Some(vector) = embedding {
            body["vectorQueries"] = json!([{
                "kind": "vector",
                "vector": vector,
                "k": 50,
                "fields": "embedding",
            }]);
        }

        body
    }
}

#[async_trait]
impl SearchProvider for AzureSearchProvider {
    async fn search(
        &self,
        query: &str,
        embedding: Option<&[f32]>,
        options: &RagOptions,
    ) -> Result<Vec<ContentSource>> {
        let request = self.build_request(query, embedding, options);

        let response = self
            .client
            .post(format!("{}/indexes/{}/docs/search", self.endpoint, self.index))
            .query(&[("api-version", SEARCH_API_VERSION)])
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("Azure Search API error {}: {}", status, body);
        }

        let result: AzureSearchResponse = response.json().await?;
        let use_captions = options.semantic_ranker && options.semantic_captions;

        Ok(result
            .value
            .into_iter()
            .map(|doc| {
                let content = match (&doc.captions, use_captions) {
                    (Some(captions), true) if !captions.is_empty() => captions
                        .iter()
                        .map(|c| c.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" . "),
                    _ => doc.content,
                };
                ContentSource::new(doc.sourcepage, content)
            })
            .collect())
    }
}

pub struct MockSearchProvider {
    sources: Vec<ContentSource>,
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            sources: vec![ContentSource::new(
                "mock.pdf#page=1",
                "This is a mock search result",
            )],
        }
    }

    pub fn with_sources(sources: Vec<ContentSource>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _embedding: Option<&[f32]>,
        options: &RagOptions,
    ) -> Result<Vec<ContentSource>> {
        Ok(self.sources.iter().take(options.top).cloned().collect())
    }
}
