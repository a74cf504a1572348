use std::path::Path;

use serde::{Deserialize, Serialize};

/// A source document: identity is the source path, content is plain
/// extracted text. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source_path: String,
    pub filename: String,
    pub text: String,
}

impl Document {
    pub fn new(path: &Path, text: String) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            source_path: path.to_string_lossy().to_string(),
            filename,
            text,
        }
    }

    /// File stem used to derive chunk identifiers.
    pub fn stem(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.filename.clone())
    }
}

/// A bounded, possibly overlapping slice of a document's text: the unit
/// of embedding and retrieval. Created once during ingestion and never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier: `<document-stem>_<ordinal>`.
    pub chunk_id: String,
    pub content: String,
    pub filename: String,
    pub source_path: String,
    /// 1-based position within the document.
    pub page: u32,
}

impl DocumentChunk {
    pub fn generate_id(stem: &str, page: u32) -> String {
        format!("{stem}_{page}")
    }

    pub fn from_document(document: &Document, content: String, page: u32) -> Self {
        Self {
            chunk_id: Self::generate_id(&document.stem(), page),
            content,
            filename: document.filename.clone(),
            source_path: document.source_path.clone(),
            page,
        }
    }
}

/// Metadata persisted alongside a chunk's vector and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: String,
    pub filename: String,
    pub source_path: String,
    pub page: u32,
}

impl ChunkMetadata {
    /// Deterministic UUID for stores that require UUID record ids.
    ///
    /// Derived from the source path and ordinal, not the display
    /// `chunk_id`: file stems are not unique across directories, and
    /// ingesting a new document must never overwrite another one.
    /// Re-ingesting the same file upserts its chunks in place.
    pub fn point_id(&self) -> String {
        let identity = format!("{}#{}", self.source_path, self.page);
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, identity.as_bytes()).to_string()
    }
}

impl From<&DocumentChunk> for ChunkMetadata {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            filename: chunk.filename.clone(),
            source_path: chunk.source_path.clone(),
            page: chunk.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_document_stem() {
        let doc = Document::new(&PathBuf::from("/docs/manual.txt"), "text".to_string());
        assert_eq!(doc.filename, "manual.txt");
        assert_eq!(doc.stem(), "manual");
    }

    #[test]
    fn test_chunk_id_scheme() {
        assert_eq!(DocumentChunk::generate_id("manual", 3), "manual_3");
    }

    #[test]
    fn test_point_id_deterministic() {
        let doc = Document::new(&PathBuf::from("a.txt"), "x".to_string());
        let c1 = ChunkMetadata::from(&DocumentChunk::from_document(&doc, "x".to_string(), 1));
        let c2 = ChunkMetadata::from(&DocumentChunk::from_document(&doc, "x".to_string(), 1));
        assert_eq!(c1.point_id(), c2.point_id());

        let c3 = ChunkMetadata::from(&DocumentChunk::from_document(&doc, "x".to_string(), 2));
        assert_ne!(c1.point_id(), c3.point_id());
    }

    #[test]
    fn test_point_id_distinct_for_same_stem_in_different_directories() {
        let a = Document::new(&PathBuf::from("/corpus/alpha/notes.txt"), "x".to_string());
        let b = Document::new(&PathBuf::from("/corpus/beta/notes.txt"), "x".to_string());

        let ma = ChunkMetadata::from(&DocumentChunk::from_document(&a, "x".to_string(), 1));
        let mb = ChunkMetadata::from(&DocumentChunk::from_document(&b, "x".to_string(), 1));

        // Same display id, but storage identity must not collide
        assert_eq!(ma.chunk_id, mb.chunk_id);
        assert_ne!(ma.point_id(), mb.point_id());
    }
}
