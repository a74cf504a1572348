//! Data models shared across the crate.

mod config;
mod document;
mod query;

pub use config::{
    Config, DEFAULT_COLLECTION, DEFAULT_OPENAI_URL, DEFAULT_QDRANT_URL, EmbeddingConfig,
    IngestionConfig, LlmConfig, QueryConfig, VectorStoreConfig,
};
pub use document::{ChunkMetadata, Document, DocumentChunk};
pub use query::{Citation, ConversationTurn, QueryResult, dedup_citations, format_citations};
