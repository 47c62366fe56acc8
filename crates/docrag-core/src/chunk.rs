//! Overlapping word-window chunker.
//!
//! Splits normalized document text into fixed-size windows of words, with a
//! configurable number of words shared between consecutive windows. Chunk
//! boundaries depend only on the text and the two parameters, so re-indexing
//! the same document always reproduces the same chunks.
//!
//! # Algorithm
//!
//! 1. Normalize whitespace and split on single spaces.
//! 2. Clamp `size` to at least [`MIN_CHUNK_WORDS`] and `overlap` to `[0, size - 1]`.
//! 3. `step = max(1, size - overlap)`.
//! 4. Emit `words[i..i + size]` for `i = 0, step, 2·step, …`, stopping after
//!    the first window whose end reaches the last word.
//!
//! # Example
//!
//! ```rust
//! use docrag_core::chunk::Chunker;
//!
//! let chunker = Chunker::new(50, 10);
//! let text = (0..120).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
//! let chunks = chunker.chunk(&text);
//! assert_eq!(chunks.len(), 3);
//! assert!(chunks[1].starts_with("w40 "));
//! ```

use crate::text::normalize_whitespace;

/// Smallest window the chunker will produce, in words.
pub const MIN_CHUNK_WORDS: usize = 50;

/// Word-window chunker with clamped parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Build a chunker, clamping `size` to at least 50 words and `overlap`
    /// to `[0, size - 1]`.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(MIN_CHUNK_WORDS);
        let overlap = overlap.min(size - 1);
        Self { size, overlap }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance in words between consecutive window starts.
    pub fn step(&self) -> usize {
        self.size.saturating_sub(self.overlap).max(1)
    }

    /// Split `text` into overlapping windows. Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = normalized.split(' ').collect();
        let step = self.step();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + self.size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if start + self.size >= words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Convenience wrapper around [`Chunker::chunk`].
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    Chunker::new(size, overlap).chunk(text)
}
