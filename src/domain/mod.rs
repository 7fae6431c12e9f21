//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod history;
pub mod llm;
pub mod medical;
pub mod search;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, Sha256KeyGenerator};
pub use error::DomainError;
pub use history::{HistoryRecord, HistoryRepository};
pub use llm::{
    ContentPart, FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message,
    MessageRole, Usage,
};
pub use medical::{
    AiAnswer, ImageAttachment, InvalidReason, QueryMode, QueryValidator, ValidationOutcome,
};
pub use search::{
    SearchContext, SearchDepth, SearchProvider, SearchRequest, SearchResponse, SearchResult,
    Source,
};
