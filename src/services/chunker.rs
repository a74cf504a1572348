//! Recursive text chunking with character overlap.
//!
//! Splitting walks a prioritized separator hierarchy (paragraph break,
//! line break, space, then raw character windows), re-splitting any
//! piece still over the size bound with the next separator. Small
//! pieces are merged back up to the bound, and every chunk after the
//! first is prefixed with the trailing `chunk_overlap` characters of
//! its predecessor. Separators stay attached to the text they
//! terminate, so concatenating the chunks' non-overlap portions
//! reconstructs the input exactly.

use crate::error::ConfigError;
use crate::models::{Document, DocumentChunk, IngestionConfig};

/// Default separator hierarchy. The empty string means character-level
/// windows and must come last.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Text chunker that splits documents into bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum new (non-overlap) characters per chunk.
    chunk_size: usize,
    /// Characters of trailing context carried into the next chunk.
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a chunker, rejecting degenerate size/overlap combinations
    /// before any text is processed.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        Self::with_separators(
            chunk_size,
            chunk_overlap,
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a chunker with a custom separator hierarchy.
    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::Validation(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::Validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    pub fn from_config(config: &IngestionConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split raw text into an ordered sequence of chunk strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let pieces = self.split_recursive(text, &self.separators);
        self.merge(pieces)
    }

    /// Chunk a document, assigning 1-based ordinals and stable ids.
    pub fn chunk_document(&self, document: &Document) -> Vec<DocumentChunk> {
        self.split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(idx, content)| {
                DocumentChunk::from_document(document, content, (idx + 1) as u32)
            })
            .collect()
    }

    /// Break text into atomic pieces no larger than `chunk_size` where
    /// the separator hierarchy allows it. A piece that no remaining
    /// separator can break is kept whole.
    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        for (idx, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                return char_windows(text, self.chunk_size);
            }
            if !text.contains(sep.as_str()) {
                continue;
            }

            let mut pieces = Vec::new();
            for part in split_keep_separator(text, sep) {
                if char_len(part) > self.chunk_size {
                    pieces.extend(self.split_recursive(part, &separators[idx + 1..]));
                } else {
                    pieces.push(part.to_string());
                }
            }
            return pieces;
        }

        // Separator hierarchy exhausted: one atomic unit, kept whole.
        vec![text.to_string()]
    }

    /// Merge adjacent small pieces greedily up to `chunk_size` of new
    /// content per chunk, then prefix each chunk after the first with
    /// the trailing `chunk_overlap` characters of its predecessor.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut core = String::new();
        let mut core_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if core_len > 0 && core_len + piece_len > self.chunk_size {
                self.push_chunk(&mut chunks, std::mem::take(&mut core));
                core_len = 0;
            }
            core.push_str(&piece);
            core_len += piece_len;
        }

        if core_len > 0 {
            self.push_chunk(&mut chunks, core);
        }

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, core: String) {
        match chunks.last() {
            Some(prev) if self.chunk_overlap > 0 => {
                let mut chunk = tail_chars(prev, self.chunk_overlap).to_string();
                chunk.push_str(&core);
                chunks.push(chunk);
            }
            _ => chunks.push(core),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s` (all of `s` when shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        return s;
    }
    let skip = len - n;
    match s.char_indices().nth(skip) {
        Some((byte_idx, _)) => &s[byte_idx..],
        None => s,
    }
}

/// Split on `sep`, keeping the separator attached to the piece it
/// terminates so that concatenation round-trips.
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(sep) {
        let end = start + pos + sep.len();
        parts.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }

    parts
}

/// Non-overlapping character windows of `size` (last may be shorter).
fn char_windows(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|w| w.iter().collect())
        .collect()
}
