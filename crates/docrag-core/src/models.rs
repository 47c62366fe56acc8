//! Core data models used throughout docrag.
//!
//! These types represent the documents, chunks, and retrieval results that
//! flow through the ingestion and retrieval pipeline.

use serde::Serialize;

/// A document row. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub title: Option<String>,
    /// Unix timestamp (seconds) of ingestion.
    pub ingested_at: i64,
}

/// A document together with the number of chunks it owns.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub document: Document,
    pub chunk_count: i64,
}

/// A persisted chunk as returned by [`Store::load_chunks`](crate::store::Store::load_chunks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredChunk {
    pub document_id: i64,
    pub chunk_index: i64,
    pub text: String,
}

/// A chunk scored against a specific query. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub document_id: i64,
    pub chunk_index: i64,
    pub text: String,
    pub score: f64,
}

impl RetrievedChunk {
    pub fn from_stored(chunk: StoredChunk, score: f64) -> Self {
        Self {
            document_id: chunk.document_id,
            chunk_index: chunk.chunk_index,
            text: chunk.text,
            score,
        }
    }
}
