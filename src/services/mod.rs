pub mod chunker;
pub mod embedding;
pub mod engine;
pub mod ingest;
pub mod llm;
pub mod memory;
pub mod vector_store;

pub use chunker::TextChunker;
pub use embedding::{EmbeddingGateway, OpenAiEmbeddingClient};
pub use engine::QueryEngine;
pub use ingest::{IngestionPipeline, IngestionReport};
pub use llm::{ChatPrompt, LanguageModel, OpenAiChatClient};
pub use memory::ConversationMemory;
pub use vector_store::{ChunkRecord, ScoredChunk, VectorStore, create_backend};
