//! Retrieval-augmented query engine.
//!
//! One engine instance serves one session: embed the question, retrieve
//! the top-k chunks, assemble a grounded prompt with the conversation
//! so far, generate, and package the answer with deduplicated
//! citations. A failed query leaves memory and the session untouched.

use std::time::Instant;

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::error::QueryError;
use crate::models::{QueryResult, dedup_citations};
use crate::services::embedding::EmbeddingGateway;
use crate::services::llm::{ChatPrompt, LanguageModel};
use crate::services::memory::ConversationMemory;
use crate::services::vector_store::{ScoredChunk, VectorStore};

const SYSTEM_PREAMBLE: &str = "You are a helpful assistant answering questions about a \
document collection. Answer using only the context excerpts below. If the context does \
not contain the answer, say so plainly.";

pub struct QueryEngine<'a> {
    embedder: &'a dyn EmbeddingGateway,
    store: &'a dyn VectorStore,
    model: &'a dyn LanguageModel,
    memory: ConversationMemory,
    top_k: u64,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingGateway,
        store: &'a dyn VectorStore,
        model: &'a dyn LanguageModel,
        memory: ConversationMemory,
        top_k: u64,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            memory,
            top_k,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn reset_memory(&mut self) {
        self.memory.reset();
    }

    /// Answer a question, blocking until the full answer is available.
    pub async fn answer(&mut self, question: &str) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let (prompt, hits) = self.prepare(question).await?;

        let answer = self.model.generate(&prompt).await?;

        Ok(self.commit(question, answer, &hits, started))
    }

    /// Answer a question, forwarding answer fragments to `sink` as they
    /// arrive. The returned result carries the assembled full answer.
    pub async fn answer_streaming<F>(
        &mut self,
        question: &str,
        mut sink: F,
    ) -> Result<QueryResult, QueryError>
    where
        F: FnMut(&str),
    {
        let started = Instant::now();
        let (prompt, hits) = self.prepare(question).await?;

        let mut stream = self.model.generate_stream(prompt);
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            sink(&fragment);
            answer.push_str(&fragment);
        }

        Ok(self.commit(question, answer, &hits, started))
    }

    /// Shared front half: validate, embed, retrieve, assemble prompt.
    /// No state is mutated here, so a failure at any step leaves the
    /// engine exactly as it was.
    async fn prepare(
        &self,
        question: &str,
    ) -> Result<(ChatPrompt, Vec<ScoredChunk>), QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        if self.store.count().await? == 0 {
            return Err(QueryError::EmptyIndex);
        }

        let query_vector = self.embedder.embed_query(question).await?;
        let hits = self
            .store
            .similarity_search(query_vector, self.top_k)
            .await?;

        debug!(hits = hits.len(), k = self.top_k, "retrieved context");

        let prompt = ChatPrompt {
            system: build_system_prompt(&hits),
            history: self.memory.history(),
            question: question.to_string(),
        };

        Ok((prompt, hits))
    }

    /// Shared back half: record the turn and package the result. Only
    /// reached on success.
    fn commit(
        &mut self,
        question: &str,
        answer: String,
        hits: &[ScoredChunk],
        started: Instant,
    ) -> QueryResult {
        let citations = dedup_citations(hits.iter().map(|h| &h.metadata));
        self.memory.append(question.trim(), answer.clone());

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(duration_ms, citations = citations.len(), "query answered");

        QueryResult {
            answer,
            citations,
            duration_ms,
        }
    }
}

/// Combine the grounding preamble with the retrieved excerpts.
fn build_system_prompt(hits: &[ScoredChunk]) -> String {
    use std::fmt::Write;

    let mut prompt = String::from(SYSTEM_PREAMBLE);
    prompt.push_str("\n\nContext excerpts:\n");

    for (i, hit) in hits.iter().enumerate() {
        writeln!(
            prompt,
            "\n[{}] {} (page {}):\n{}",
            i + 1,
            hit.metadata.filename,
            hit.metadata.page,
            hit.content
        )
        .unwrap();
    }

    prompt
}
