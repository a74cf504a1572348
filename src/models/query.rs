//! Query-side models: turns, citations, and answers.

use serde::{Deserialize, Serialize};

use super::document::ChunkMetadata;

/// One question-answer exchange, the unit of conversational memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Attribution of answer content back to a source chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub filename: String,
    pub page: u32,
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (page {})", self.filename, self.page)
    }
}

/// Deduplicate citations by (filename, page), preserving first-seen
/// order across the retrieved set.
pub fn dedup_citations<'a, I>(metadatas: I) -> Vec<Citation>
where
    I: IntoIterator<Item = &'a ChunkMetadata>,
{
    let mut seen = std::collections::HashSet::new();
    let mut citations = Vec::new();

    for meta in metadatas {
        let citation = Citation {
            filename: meta.filename.clone(),
            page: meta.page,
        };
        if seen.insert((citation.filename.clone(), citation.page)) {
            citations.push(citation);
        }
    }

    citations
}

/// Render citations as a single human-readable line.
pub fn format_citations(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return "No sources found.".to_string();
    }
    let parts: Vec<String> = citations.iter().map(ToString::to_string).collect();
    parts.join(", ")
}

/// The transient result of one answered question. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,

    /// Distinct sources in first-seen retrieval order.
    pub citations: Vec<Citation>,

    /// Wall-clock time from question to answer.
    pub duration_ms: u64,
}
