//! Storage abstraction for docrag.
//!
//! The [`Store`] trait is the append-only mapping of documents to their
//! ordered chunks. It has no update or delete operations: a document and all
//! of its chunks are written once, atomically, at ingestion time.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, DocumentSummary, StoredChunk};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_document`](Store::create_document) | Insert a document and all its chunks atomically |
/// | [`load_chunks`](Store::load_chunks) | Load every chunk, or one document's chunks |
/// | [`get_document`](Store::get_document) | Fetch a document row by id |
/// | [`list_documents`](Store::list_documents) | List documents with their chunk counts |
/// | [`count_chunks`](Store::count_chunks) | Number of chunks owned by a document |
///
/// # Invariants
///
/// - Chunk indices of a document are `0..n` in the order the chunks were given.
/// - If `create_document` fails, neither the document nor any of its chunks
///   becomes visible to readers.
/// - Concurrent `create_document` calls for different documents never
///   interleave their index sequences.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new document and its chunks as one unit of work.
    ///
    /// Returns the new document id.
    async fn create_document(&self, filename: &str, chunks: &[String]) -> Result<i64>;

    /// Load chunks for ranking.
    ///
    /// With `None`, returns every chunk of every document in insertion
    /// order. With `Some(id)`, returns only that document's chunks in
    /// chunk-index order (empty if the document does not exist).
    async fn load_chunks(&self, document_id: Option<i64>) -> Result<Vec<StoredChunk>>;

    async fn get_document(&self, id: i64) -> Result<Option<Document>>;

    /// All documents, oldest first.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    async fn count_chunks(&self, document_id: i64) -> Result<i64>;
}
