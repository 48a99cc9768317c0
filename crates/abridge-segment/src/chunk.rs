//! Chunk types produced by segmentation.

use serde::{Deserialize, Serialize};

/// Metadata about a chunk's location in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk index within the segmentation (0-based).
    pub index: u32,
    /// Start byte offset in the source text (inclusive).
    pub start_offset: usize,
    /// End byte offset in the source text (exclusive).
    pub end_offset: usize,
    /// True token count of the trimmed chunk text.
    pub token_count: usize,
}

impl ChunkMetadata {
    /// Creates metadata with offset and token information.
    pub fn new(index: u32, start_offset: usize, end_offset: usize, token_count: usize) -> Self {
        Self {
            index,
            start_offset,
            end_offset,
            token_count,
        }
    }

    /// Returns the byte length of the chunk.
    pub fn byte_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// A chunk produced by the segmenter (borrows from the source text).
///
/// `text` is the raw slice `[start_offset, end_offset)`; offsets cover the
/// document exactly, so surrounding whitespace stays inside the range. Use
/// [`Chunk::trimmed`] for the text handed to downstream consumers.
#[derive(Debug)]
pub struct Chunk<'a> {
    /// The chunk text (borrowed from the source).
    pub text: &'a str,
    /// Metadata about the chunk's position.
    pub metadata: ChunkMetadata,
}

impl<'a> Chunk<'a> {
    /// Creates a new chunk.
    pub fn new(text: &'a str, metadata: ChunkMetadata) -> Self {
        Self { text, metadata }
    }

    /// Returns the chunk text with surrounding whitespace removed.
    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }

    /// Converts to an owned chunk.
    pub fn into_owned(self) -> OwnedChunk {
        OwnedChunk {
            text: self.text.to_string(),
            metadata: self.metadata,
        }
    }
}

/// An owned version of [`Chunk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedChunk {
    /// The chunk text.
    pub text: String,
    /// Metadata about the chunk's position.
    pub metadata: ChunkMetadata,
}

impl OwnedChunk {
    /// Returns the chunk text with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// A boundary record: where a chunk was cut and how many tokens it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset.
    pub end: usize,
    /// Token count of the chunk.
    pub tokens: usize,
}

/// The result of one segmentation pass.
#[derive(Debug)]
pub struct Segmentation<'a> {
    /// The ordered chunk sequence.
    pub chunks: Vec<Chunk<'a>>,
    /// Boundary records, one per chunk.
    pub boundaries: Vec<Boundary>,
}

impl Segmentation<'_> {
    /// Returns the number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the segmentation produced no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Converts all chunks to owned chunks.
    pub fn into_owned(self) -> Vec<OwnedChunk> {
        self.chunks.into_iter().map(|c| c.into_owned()).collect()
    }
}
