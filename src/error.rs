//! Error types for the RAG chat CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration and startup validation.
///
/// These are fatal: the process exits non-zero with remediation steps
/// rather than limping along with a broken setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required credential: {0} (set it in the environment or a .env file)")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    Connection(String),

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding request timed out")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Connection(_) | EmbeddingError::Timeout => true,
            // Provider errors might be transient (429, 5xx)
            EmbeddingError::Provider(msg) => is_transient_status(msg),
            EmbeddingError::Request(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to language model generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to connect to language model provider: {0}")]
    Connection(String),

    #[error("language model provider error: {0}")]
    Provider(String),

    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("generation request timed out")]
    Timeout,
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Connection(_) | GenerationError::Timeout => true,
            GenerationError::Provider(msg) => is_transient_status(msg),
            GenerationError::Request(e) => e.is_timeout() || e.is_connect(),
            // A broken stream cannot be resumed mid-answer
            GenerationError::Stream(_) | GenerationError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    Connection(String),

    #[error("collection error: {0}")]
    Collection(String),

    #[error("append error: {0}")]
    Append(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("delete error: {0}")]
    Delete(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::Connection(_) => true,
            VectorStoreError::Collection(msg)
            | VectorStoreError::Append(msg)
            | VectorStoreError::Search(msg)
            | VectorStoreError::Delete(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("connection")
                    || msg.contains("unavailable")
                    || msg.contains("too many")
            }
        }
    }
}

/// Errors related to loading a single source document.
///
/// Recovered locally during ingestion: the document is skipped and the
/// run continues.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("documents directory not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {cause}")]
    Read { path: String, cause: String },
}

/// Errors aborting an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no documents found to ingest")]
    NoDocuments,

    #[error("batch {batch_index} failed after {batches_completed} completed batch(es): {cause}")]
    Batch {
        /// 1-based index of the failed batch.
        batch_index: usize,
        /// Number of batches durably written before the failure.
        batches_completed: usize,
        #[source]
        cause: BatchError,
    },

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Cause of a mid-run batch failure.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store append error: {0}")]
    Store(#[from] VectorStoreError),
}

/// Errors answering a single question.
///
/// Recovered at the query boundary: the error is reported and the
/// conversation loop continues with memory intact.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("the knowledge base is empty; run `ragchat ingest` first")]
    EmptyIndex,

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] VectorStoreError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Heuristic check for transient provider status messages.
fn is_transient_status(msg: &str) -> bool {
    msg.contains("503")
        || msg.contains("502")
        || msg.contains("504")
        || msg.contains("429")
        || msg.to_lowercase().contains("unavailable")
        || msg.to_lowercase().contains("too many requests")
        || msg.to_lowercase().contains("rate limit")
}
