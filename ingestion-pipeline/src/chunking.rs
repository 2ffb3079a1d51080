use text_splitter::{Characters, ChunkConfig, TextSplitter};

use common::{error::AppError, utils::config::AppConfig};

/// Splits text into ordered, possibly overlapping chunks.
pub trait Chunker: Send + Sync {
    fn split(&self, text: &str) -> Result<Vec<String>, AppError>;
}

/// Character-counted splitter that prefers paragraph, line and word boundaries.
pub struct CharacterChunker {
    splitter: TextSplitter<Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be greater than 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Validation(format!("invalid chunk configuration: {e}")))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for CharacterChunker {
    fn split(&self, text: &str) -> Result<Vec<String>, AppError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .splitter
            .chunks(text)
            .map(str::to_owned)
            .filter(|chunk| !chunk.trim().is_empty())
            .collect())
    }
}
