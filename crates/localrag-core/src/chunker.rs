//! Fixed-size, overlapping chunking of document text.
//!
//! Units are chars (Unicode scalar values). Chunk `i + 1` starts `overlap`
//! chars before the end of chunk `i`, so a sentence cut by one boundary is
//! whole in at least one neighbour as long as it fits in `overlap`. The last
//! chunk may be shorter than `chunk_size`; it is neither padded nor dropped.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be at least 1".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Rejects `overlap >= chunk_size` rather than clamping it.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Lazily walk the document's chunks. The iterator is `Clone`, and
    /// calling `chunks` again restarts from the first chunk.
    pub fn chunks<'a>(&self, document: &'a Document) -> Chunks<'a> {
        let mut offsets: Vec<usize> = document.text.char_indices().map(|(i, _)| i).collect();
        offsets.push(document.text.len());
        let next_start = if document.text.is_empty() { None } else { Some(0) };
        Chunks { document, offsets, config: self.config, next_start, index: 0 }
    }

    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.chunks(document).collect()
    }

    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.chunks(d)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document: &'a Document,
    /// Byte offset of every char, plus the text length as a sentinel.
    offsets: Vec<usize>,
    config: ChunkingConfig,
    next_start: Option<usize>,
    index: usize,
}

impl Chunks<'_> {
    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn remaining(&self) -> usize {
        let Some(start) = self.next_start else { return 0 };
        let rest = self.char_len() - start;
        if rest <= self.config.chunk_size {
            return 1;
        }
        let step = self.config.chunk_size - self.config.overlap;
        1 + (rest - self.config.chunk_size).div_ceil(step)
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let total = self.char_len();
        let end = (start + self.config.chunk_size).min(total);
        let text = self.document.text[self.offsets[start]..self.offsets[end]].to_string();
        self.next_start = if end < total { Some(end - self.config.overlap) } else { None };

        let index = self.index;
        self.index += 1;
        Some(Chunk {
            id: format!("{}#{}", self.document.id, index),
            doc_id: self.document.id.clone(),
            index,
            text,
            span: start..end,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}
