//! Recursive chunking strategy

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::{Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Separators tried in order, coarsest first; the empty separator splits
/// into grapheme clusters
const DEFAULT_SEPARATORS: &[&str] = &[
    "\n\n", "\n", "。", "！", "？", ". ", "! ", "? ", "；", "; ", "，", ", ", " ", "",
];

/// Chunking strategy that recursively splits text hierarchically.
///
/// Text is split on the coarsest separator it contains; pieces that still
/// exceed `chunk_size` are split again with the next separator. Adjacent
/// pieces are then merged back into chunks of at most `chunk_size`
/// characters, carrying up to `chunk_overlap` characters of the previous
/// chunk. Separators stay attached to the end of the piece they follow.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveChunker {
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_separators(separators: Vec<String>) -> Self {
        Self { separators }
    }

    fn split_text(&self, text: &str, separators: &[String], config: &ChunkingConfig) -> Vec<String> {
        let mut chunks = Vec::new();

        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()));

        let (separator, finer) = match position {
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => ("", &separators[separators.len()..]),
        };

        let pieces: Vec<&str> = if separator.is_empty() {
            text.graphemes(true).collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(merge_pieces(&fitting, config));
                fitting.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_text(piece, finer, config));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, config));
        }

        chunks
    }
}

fn find_from(content: &str, from: usize, text: &str) -> Option<usize> {
    content[from..].find(text).map(|offset| from + offset)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn merge_pieces(pieces: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut merged = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            push_window(&window, &mut merged);

            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                let Some(front) = window.pop_front() else {
                    break;
                };
                total -= char_len(front);
            }
        }

        window.push_back(piece);
        total += len;
    }

    push_window(&window, &mut merged);
    merged
}

fn push_window(window: &VecDeque<&str>, merged: &mut Vec<String>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();

    if !trimmed.is_empty() {
        merged.push(trimmed.to_string());
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let content = content.trim();

        if content.is_empty() {
            return Ok(vec![]);
        }

        let texts: Vec<String> = self
            .split_text(content, &self.separators, config)
            .into_iter()
            .filter(|text| char_len(text) >= config.min_chunk_size)
            .collect();

        let total = texts.len();
        let mut prev_start = 0;
        let mut search_from = 0;
        let mut chunks = Vec::with_capacity(total);

        for (index, text) in texts.into_iter().enumerate() {
            // Overlapping chunks may begin where the previous one did
            let byte_start = find_from(content, search_from, &text)
                .or_else(|| find_from(content, prev_start, &text))
                .unwrap_or(prev_start);

            prev_start = byte_start;
            search_from =
                byte_start + content[byte_start..].chars().next().map_or(0, char::len_utf8);

            chunks.push(Chunk::new(
                text,
                ChunkMetadata {
                    chunk_index: index,
                    total_chunks: total,
                    byte_start,
                },
            ));
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_empty_content() {
        let chunker = RecursiveChunker::new();

        assert!(chunker.chunk("", &ChunkingConfig::default()).unwrap().is_empty());
        assert!(chunker.chunk(" \n\n ", &ChunkingConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_small_content() {
        let chunker = RecursiveChunker::new();
        let chunks = chunker.chunk("  Small content\n", &ChunkingConfig::new(1000, 0)).unwrap();

        assert_eq!(contents(&chunks), vec!["Small content"]);
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn test_split_by_paragraphs() {
        let chunker = RecursiveChunker::new();
        let content = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";

        let chunks = chunker.chunk(content, &ChunkingConfig::new(30, 0)).unwrap();

        assert_eq!(
            contents(&chunks),
            vec!["First paragraph here.", "Second paragraph here.", "Third paragraph here."]
        );
    }

    #[test]
    fn test_overlap_carries_previous_words() {
        let chunker = RecursiveChunker::new();

        let chunks = chunker
            .chunk("aaaa bbbb cccc dddd", &ChunkingConfig::new(10, 5))
            .unwrap();

        assert_eq!(contents(&chunks), vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
        let starts: Vec<usize> = chunks.iter().map(|c| c.metadata.byte_start).collect();
        assert_eq!(starts, vec![0, 5, 10]);
    }

    #[test]
    fn test_cjk_sentences_keep_punctuation() {
        let chunker = RecursiveChunker::new();

        let chunks = chunker
            .chunk("第一句。第二句。第三句。", &ChunkingConfig::new(5, 0))
            .unwrap();

        assert_eq!(contents(&chunks), vec!["第一句。", "第二句。", "第三句。"]);
        assert_eq!(chunks[1].metadata.byte_start, "第一句。".len());
    }

    #[test]
    fn test_overlapping_cjk_chunks_sharing_a_start() {
        let chunker = RecursiveChunker::new();
        let content = "ab  知 识\n库";

        let chunks = chunker.chunk(content, &ChunkingConfig::new(4, 2)).unwrap();

        assert_eq!(contents(&chunks), vec!["ab", "知", "知 识", "库"]);
        let starts: Vec<usize> = chunks.iter().map(|c| c.metadata.byte_start).collect();
        assert_eq!(starts, vec![0, 4, 4, 12]);
        for chunk in &chunks {
            assert!(content[chunk.metadata.byte_start..].starts_with(&chunk.content));
        }
    }

    #[test]
    fn test_unbreakable_word_falls_back_to_characters() {
        let chunker = RecursiveChunker::new();

        let chunks = chunker.chunk("abcdefghij", &ChunkingConfig::new(4, 0)).unwrap();

        assert_eq!(contents(&chunks), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_min_chunk_size_drops_fragments() {
        let chunker = RecursiveChunker::new();
        let config = ChunkingConfig::new(10, 0).with_min_chunk_size(3);

        let chunks = chunker.chunk("aaaaaaaa bb", &config).unwrap();

        assert_eq!(contents(&chunks), vec!["aaaaaaaa"]);
        assert_eq!(chunks[0].index(), 0);
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn test_chunks_respect_size() {
        let chunker = RecursiveChunker::new();
        let config = ChunkingConfig::new(50, 10);
        let content = "# Introduction\n\nThis is the introduction paragraph. It explains the knowledge base.\n\n\
                       # Main Content\n\nThe main content has multiple sentences. Each sentence adds detail, \
                       and some clauses are long enough to need splitting.";

        let chunks = chunker.chunk(content, &config).unwrap();

        assert!(chunks.len() > 3);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 50));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index(), i);
            assert_eq!(chunk.metadata.total_chunks, chunks.len());
        }
    }

    #[test]
    fn test_invalid_config() {
        let chunker = RecursiveChunker::new();
        assert!(chunker.chunk("text", &ChunkingConfig::new(10, 10)).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(RecursiveChunker::new().name(), "recursive");
    }
}
