//! Batched ingestion pipeline: documents -> chunks -> vectors -> store.

use tracing::{info, warn};

use crate::error::{BatchError, IngestError, SourceError};
use crate::models::Document;
use crate::services::chunker::TextChunker;
use crate::services::embedding::EmbeddingGateway;
use crate::services::vector_store::{ChunkRecord, VectorStore};

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    /// Documents successfully chunked and indexed.
    pub documents_processed: u64,
    /// Documents skipped with their failure reasons.
    pub failed_documents: Vec<(String, String)>,
    pub chunks_indexed: u64,
    pub batches_completed: u64,
}

/// Orchestrates chunking, batching, embedding, and store appends.
///
/// Batch boundaries never change the final indexed content relative to
/// one unbounded call. Appends are additive: a clean rebuild requires
/// clearing the collection first.
pub struct IngestionPipeline<'a> {
    chunker: &'a TextChunker,
    embedder: &'a dyn EmbeddingGateway,
    store: &'a dyn VectorStore,
    batch_size: usize,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        chunker: &'a TextChunker,
        embedder: &'a dyn EmbeddingGateway,
        store: &'a dyn VectorStore,
        batch_size: usize,
    ) -> Self {
        debug_assert!(batch_size > 0);
        Self {
            chunker,
            embedder,
            store,
            batch_size,
        }
    }

    /// Ingest a corpus of documents.
    ///
    /// A per-document load failure is logged and skipped; the run
    /// continues. An embedding or store failure mid-run aborts with the
    /// number of durably completed batches.
    pub async fn ingest<I>(&self, documents: I) -> Result<IngestionReport, IngestError>
    where
        I: IntoIterator<Item = Result<Document, SourceError>>,
    {
        let mut report = IngestionReport::default();
        let mut chunks = Vec::new();

        for document in documents {
            match document {
                Ok(doc) => {
                    let doc_chunks = self.chunker.chunk_document(&doc);
                    info!(
                        filename = %doc.filename,
                        chunks = doc_chunks.len(),
                        "chunked document"
                    );
                    chunks.extend(doc_chunks);
                    report.documents_processed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "skipping document");
                    report.failed_documents.push((source_of(&e), e.to_string()));
                }
            }
        }

        if report.documents_processed == 0 {
            return Err(IngestError::NoDocuments);
        }

        report.chunks_indexed = chunks.len() as u64;
        let total_batches = chunks.len().div_ceil(self.batch_size);

        self.store.create_collection().await?;

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            info!(
                batch = batch_index + 1,
                total = total_batches,
                size = batch.len(),
                "processing batch"
            );

            self.process_batch(batch, batch_index).await?;
            report.batches_completed += 1;
        }

        info!(
            documents = report.documents_processed,
            chunks = report.chunks_indexed,
            batches = report.batches_completed,
            "ingestion complete"
        );

        Ok(report)
    }

    /// One embedding call and one store append for a batch of chunks.
    /// `batch_index` is 0-based and doubles as the completed-batch
    /// count when this batch fails.
    async fn process_batch(
        &self,
        batch: &[crate::models::DocumentChunk],
        batch_index: usize,
    ) -> Result<(), IngestError> {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

        let vectors = self.embedder.embed(&texts).await.map_err(|e| {
            IngestError::Batch {
                batch_index: batch_index + 1,
                batches_completed: batch_index,
                cause: BatchError::Embedding(e),
            }
        })?;

        let records: Vec<ChunkRecord> = batch
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkRecord {
                vector,
                content: chunk.content.clone(),
                metadata: chunk.into(),
            })
            .collect();

        self.store.add_records(records).await.map_err(|e| {
            IngestError::Batch {
                batch_index: batch_index + 1,
                batches_completed: batch_index,
                cause: BatchError::Store(e),
            }
        })
    }
}

fn source_of(error: &SourceError) -> String {
    match error {
        SourceError::NotFound(path) => path.clone(),
        SourceError::Read { path, .. } => path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{EmbeddingError, VectorStoreError};
    use crate::models::ChunkMetadata;
    use crate::services::vector_store::ScoredChunk;

    /// Deterministic fake: one fixed-width vector per input text.
    struct FakeEmbedder {
        pub calls: AtomicUsize,
        pub fail_on_call: Option<usize>,
    }

    impl FakeEmbedder {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call: None,
            }
        }

        pub fn failing_on(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call: Some(call),
            }
        }
    }

    #[async_trait]
    impl EmbeddingGateway for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(EmbeddingError::Provider("status 500: boom".to_string()));
            }
            Ok(texts.iter().map(|t| bag_of_chars(t)).collect())
        }
    }

    /// 26-dim letter-frequency vector; lexically similar texts score close.
    fn bag_of_chars(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 26];
        for c in text.to_lowercase().chars() {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }

    struct FakeStore {
        pub records: Mutex<Vec<ChunkRecord>>,
        pub append_calls: AtomicUsize,
        pub created: AtomicUsize,
    }

    impl FakeStore {
        pub fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                append_calls: AtomicUsize::new(0),
                created: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn create_collection(&self) -> Result<(), VectorStoreError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn add_records(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError> {
            self.append_calls.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().extend(records);
            Ok(())
        }

        async fn count(&self) -> Result<u64, VectorStoreError> {
            Ok(self.records.lock().unwrap().len() as u64)
        }

        async fn similarity_search(
            &self,
            query_vector: Vec<f32>,
            k: u64,
        ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
            let records = self.records.lock().unwrap();
            let mut hits: Vec<ScoredChunk> = records
                .iter()
                .map(|r| ScoredChunk {
                    content: r.content.clone(),
                    metadata: r.metadata.clone(),
                    score: cosine(&query_vector, &r.vector),
                })
                .collect();
            // Ties break by insertion order: stable sort on score only
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            hits.truncate(k as usize);
            Ok(hits)
        }

        async fn clear_collection(&self) -> Result<(), VectorStoreError> {
            self.records.lock().unwrap().clear();
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            Ok(true)
        }

        fn collection(&self) -> &str {
            "test"
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    fn doc(name: &str, text: &str) -> Result<Document, SourceError> {
        Ok(Document::new(&PathBuf::from(name), text.to_string()))
    }

    fn chunker() -> TextChunker {
        TextChunker::new(20, 5).unwrap()
    }

    #[tokio::test]
    async fn test_batch_count_is_ceil_chunks_over_batch_size() {
        let chunker = chunker();
        let embedder = FakeEmbedder::new();
        let store = FakeStore::new();
        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 2);

        // Two documents, 3 chunks each (the worked example text)
        let text = "The quick brown fox. Jumps over the lazy dog.";
        let report = pipeline
            .ingest(vec![doc("a.txt", text), doc("b.txt", text)])
            .await
            .unwrap();

        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.chunks_indexed, 6);
        // ceil(6 / 2) = 3 embedding calls and 3 appends
        assert_eq!(report.batches_completed, 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.append_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_short_last_batch() {
        let chunker = chunker();
        let embedder = FakeEmbedder::new();
        let store = FakeStore::new();
        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 4);

        let text = "The quick brown fox. Jumps over the lazy dog.";
        let report = pipeline.ingest(vec![doc("a.txt", text)]).await.unwrap();

        assert_eq!(report.chunks_indexed, 3);
        assert_eq!(report.batches_completed, 1);
    }

    #[tokio::test]
    async fn test_failed_document_is_skipped_not_fatal() {
        let chunker = chunker();
        let embedder = FakeEmbedder::new();
        let store = FakeStore::new();
        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 10);

        let documents = vec![
            doc("a.txt", "Some perfectly fine text."),
            Err(SourceError::Read {
                path: "b.txt".to_string(),
                cause: "permission denied".to_string(),
            }),
            doc("c.txt", "More fine text here."),
        ];

        let report = pipeline.ingest(documents).await.unwrap();
        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.failed_documents.len(), 1);
        assert_eq!(report.failed_documents[0].0, "b.txt");
    }

    #[tokio::test]
    async fn test_no_documents_is_an_error() {
        let chunker = chunker();
        let embedder = FakeEmbedder::new();
        let store = FakeStore::new();
        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 10);

        let result = pipeline.ingest(Vec::new()).await;
        assert!(matches!(result, Err(IngestError::NoDocuments)));
    }

    #[tokio::test]
    async fn test_batch_failure_aborts_and_reports_progress() {
        let chunker = chunker();
        let embedder = FakeEmbedder::failing_on(2);
        let store = FakeStore::new();
        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 2);

        let text = "The quick brown fox. Jumps over the lazy dog.";
        let result = pipeline
            .ingest(vec![doc("a.txt", text), doc("b.txt", text)])
            .await;

        match result {
            Err(IngestError::Batch {
                batch_index,
                batches_completed,
                cause: BatchError::Embedding(_),
            }) => {
                assert_eq!(batch_index, 2);
                assert_eq!(batches_completed, 1);
            }
            other => panic!("expected batch error, got {other:?}"),
        }

        // The first batch landed before the abort
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ingestion_into_existing_collection_is_additive() {
        let chunker = chunker();
        let embedder = FakeEmbedder::new();
        let store = FakeStore::new();

        let text = "The quick brown fox. Jumps over the lazy dog.";
        {
            let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 10);
            pipeline.ingest(vec![doc("a.txt", text)]).await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 3);

        let pipeline = IngestionPipeline::new(&chunker, &embedder, &store, 10);
        pipeline.ingest(vec![doc("b.txt", text)]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 6);
    }
}
