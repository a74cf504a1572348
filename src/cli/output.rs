//! Plain-text rendering for command output.

use std::fmt::Write as FmtWrite;

use crate::models::{QueryResult, format_citations};
use crate::services::IngestionReport;

/// Summary block printed after an ingestion run.
pub fn format_ingest_report(report: &IngestionReport, duration_ms: u64) -> String {
    let mut output = String::new();
    writeln!(output, "Ingestion Complete").unwrap();
    writeln!(output, "------------------").unwrap();
    writeln!(output, "Documents processed: {}", report.documents_processed).unwrap();
    if !report.failed_documents.is_empty() {
        writeln!(output, "Documents skipped:   {}", report.failed_documents.len()).unwrap();
    }
    writeln!(output, "Chunks indexed:      {}", report.chunks_indexed).unwrap();
    writeln!(output, "Batches completed:   {}", report.batches_completed).unwrap();
    writeln!(output, "Duration:            {}ms", duration_ms).unwrap();

    for (path, reason) in &report.failed_documents {
        writeln!(output, "  skipped {}: {}", path, reason).unwrap();
    }

    output
}

/// Answer plus its source line, as printed by `ask` and `chat`.
pub fn format_answer(result: &QueryResult) -> String {
    let mut output = String::new();
    writeln!(output, "{}", result.answer.trim_end()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Sources: {}", format_citations(&result.citations)).unwrap();
    output
}

/// Source line only, for streaming mode where the answer has already
/// been printed token by token.
pub fn format_sources_line(result: &QueryResult) -> String {
    format!("\nSources: {}\n", format_citations(&result.citations))
}

/// Status block for the `status` command.
pub struct StatusInfo {
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    pub chunks_indexed: u64,
    pub embedding_model: String,
    pub llm_model: String,
    pub api_key_present: bool,
}

pub fn format_status(status: &StatusInfo) -> String {
    let mut output = String::new();
    writeln!(output, "Status").unwrap();
    writeln!(output, "------").unwrap();

    let store_state = if status.vector_store_connected {
        "[CONNECTED]"
    } else {
        "[DISCONNECTED]"
    };
    writeln!(output, "Vector Store:  {} {}", status.vector_store_url, store_state).unwrap();
    if status.vector_store_connected {
        writeln!(output, "  Collection:  {}", status.collection).unwrap();
        writeln!(output, "  Chunks:      {}", status.chunks_indexed).unwrap();
    }
    writeln!(output).unwrap();

    writeln!(output, "Embedding:     {}", status.embedding_model).unwrap();
    writeln!(output, "LLM:           {}", status.llm_model).unwrap();

    let key_state = if status.api_key_present {
        "[SET]"
    } else {
        "[MISSING]"
    };
    writeln!(output, "API Key:       {}", key_state).unwrap();

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Citation;

    #[test]
    fn test_format_answer_includes_sources_line() {
        let result = QueryResult {
            answer: "The dog sleeps in the sun.\n".to_string(),
            citations: vec![
                Citation {
                    filename: "dogs.txt".to_string(),
                    page: 2,
                },
                Citation {
                    filename: "pets.txt".to_string(),
                    page: 1,
                },
            ],
            duration_ms: 42,
        };

        let rendered = format_answer(&result);
        assert!(rendered.starts_with("The dog sleeps in the sun.\n"));
        assert!(rendered.contains("Sources: dogs.txt (page 2), pets.txt (page 1)"));
    }

    #[test]
    fn test_format_answer_without_citations() {
        let result = QueryResult {
            answer: "I don't know.".to_string(),
            citations: vec![],
            duration_ms: 7,
        };

        assert!(format_answer(&result).contains("Sources: No sources found."));
    }

    #[test]
    fn test_format_ingest_report_lists_skipped() {
        let report = IngestionReport {
            documents_processed: 3,
            failed_documents: vec![("bad.txt".to_string(), "too large".to_string())],
            chunks_indexed: 12,
            batches_completed: 2,
        };

        let rendered = format_ingest_report(&report, 1500);
        assert!(rendered.contains("Documents processed: 3"));
        assert!(rendered.contains("Documents skipped:   1"));
        assert!(rendered.contains("skipped bad.txt: too large"));
    }
}
