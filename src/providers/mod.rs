pub mod embedding;
pub mod llm;
pub mod search;

pub use embedding::{EmbeddingProvider, OpenAIEmbeddingProvider};
pub use llm::{CompletionSettings, LLMProvider, Message, OpenAIProvider};
pub use search::{AzureSearchProvider, SearchProvider};
