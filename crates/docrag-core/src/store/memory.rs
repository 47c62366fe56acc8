//! In-memory [`Store`] implementation for tests and embedding.
//!
//! All state sits behind a single `std::sync::RwLock`, so a document and its
//! chunks are published to readers in one write.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, DocumentSummary, StoredChunk};

use super::Store;

#[derive(Default)]
struct State {
    next_id: i64,
    docs: Vec<Document>,
    chunks: Vec<StoredChunk>,
}

/// In-memory store. Document ids start at 1.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_document(&self, filename: &str, chunks: &[String]) -> Result<i64> {
        let mut state = self.state.write().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.docs.push(Document {
            id,
            filename: filename.to_string(),
            title: None,
            ingested_at: chrono::Utc::now().timestamp(),
        });
        for (i, text) in chunks.iter().enumerate() {
            state.chunks.push(StoredChunk {
                document_id: id,
                chunk_index: i as i64,
                text: text.clone(),
            });
        }
        Ok(id)
    }

    async fn load_chunks(&self, document_id: Option<i64>) -> Result<Vec<StoredChunk>> {
        let state = self.state.read().unwrap();
        let chunks = match document_id {
            None => state.chunks.clone(),
            Some(id) => {
                let mut scoped: Vec<StoredChunk> = state
                    .chunks
                    .iter()
                    .filter(|c| c.document_id == id)
                    .cloned()
                    .collect();
                scoped.sort_by_key(|c| c.chunk_index);
                scoped
            }
        };
        Ok(chunks)
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let state = self.state.read().unwrap();
        Ok(state.docs.iter().find(|d| d.id == id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let state = self.state.read().unwrap();
        Ok(state
            .docs
            .iter()
            .map(|d| DocumentSummary {
                document: d.clone(),
                chunk_count: state.chunks.iter().filter(|c| c.document_id == d.id).count() as i64,
            })
            .collect())
    }

    async fn count_chunks(&self, document_id: i64) -> Result<i64> {
        let state = self.state.read().unwrap();
        Ok(state
            .chunks
            .iter()
            .filter(|c| c.document_id == document_id)
            .count() as i64)
    }
}
