//! Splitting parsed text into embeddable pieces

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Chunk sizing, measured in characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    /// Characters repeated at the start of the next chunk
    pub chunk_overlap: usize,
    /// Fragments shorter than this are dropped
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::new(250, 50)
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size: 0,
        }
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        } = *self;

        if chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        if min_chunk_size > chunk_size {
            return Err(DomainError::validation(format!(
                "min_chunk_size ({}) exceeds chunk_size ({})",
                min_chunk_size, chunk_size
            )));
        }

        Ok(())
    }
}

/// Position of a chunk within its source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Byte offset into the trimmed source
    pub byte_start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn index(&self) -> usize {
        self.metadata.chunk_index
    }
}

pub trait ChunkingStrategy: Send + Sync + Debug {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        assert_eq!(ChunkingConfig::default(), ChunkingConfig::new(250, 50));
    }

    #[test]
    fn test_validation_reports_values() {
        assert!(ChunkingConfig::new(100, 50).validate().is_ok());
        assert!(ChunkingConfig::new(0, 0).validate().is_err());

        let err = ChunkingConfig::new(100, 100).validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap (100)"));

        let err = ChunkingConfig::new(100, 10)
            .with_min_chunk_size(101)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("min_chunk_size (101)"));
    }
}
