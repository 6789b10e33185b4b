use common::{error::AppError, utils::text::content_hash};
use text_splitter::{ChunkConfig, TextSplitter};

use crate::loader::Record;

/// A bounded segment of normalized text; the unit of embedding,
/// deduplication and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub content_hash: String,
}

impl Chunk {
    pub fn new(content: String) -> Self {
        let content_hash = content_hash(&content);
        Self {
            content,
            content_hash,
        }
    }
}

/// Splits records into chunks of at most `chunk_size` characters with
/// `chunk_overlap` characters shared between consecutive chunks. The
/// splitter prefers paragraph, then sentence, then word boundaries before
/// cutting mid-word.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    /// Splits every record, preserving text order within each record.
    pub fn split_records(&self, records: &[Record]) -> Vec<Chunk> {
        records
            .iter()
            .flat_map(|record| self.splitter.chunks(&record.text))
            .map(|chunk| Chunk::new(chunk.to_string()))
            .collect()
    }
}
