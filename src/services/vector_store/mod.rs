//! Vector store abstraction layer.
//!
//! The core treats the store as opaque persistent storage with four
//! operations: create/open a named collection, append records, count,
//! and similarity search. `count() == 0` means the index is empty and
//! queries are rejected upstream.

mod qdrant;

pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{ChunkMetadata, VectorStoreConfig};

/// A persisted (vector, text, metadata) triple.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A similarity search hit.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Abstract trait for vector store backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the named collection if it does not exist. Idempotent.
    async fn create_collection(&self) -> Result<(), VectorStoreError>;

    /// Append records. Never blocks on prior reads.
    async fn add_records(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError>;

    /// Number of records in the collection. Zero for a missing or
    /// empty collection.
    async fn count(&self) -> Result<u64, VectorStoreError>;

    /// Top-k records by decreasing similarity to the query vector.
    async fn similarity_search(
        &self,
        query_vector: Vec<f32>,
        k: u64,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError>;

    /// Drop and recreate the collection. Used only by explicit corpus
    /// rebuilds.
    async fn clear_collection(&self) -> Result<(), VectorStoreError>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// The logical collection name.
    fn collection(&self) -> &str;
}

/// Create the configured vector store backend.
pub fn create_backend(
    config: &VectorStoreConfig,
    embedding_dim: u64,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    let backend = QdrantBackend::new(config, embedding_dim)?;
    Ok(Box::new(backend))
}
