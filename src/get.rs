//! Document inspection: `docrag docs` and `docrag get`.

use anyhow::{bail, Result};
use serde::Serialize;

use docrag_core::models::{Document, DocumentSummary};
use docrag_core::store::Store;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// A document with all of its chunks, in chunk-index order.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub chunks: Vec<ChunkResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkResponse {
    pub index: i64,
    pub text: String,
}

/// Fetch one document and its chunks.
pub async fn get_document(store: &dyn Store, id: i64) -> Result<DocumentResponse> {
    let Some(document) = store.get_document(id).await? else {
        bail!("document not found: {}", id);
    };

    let chunks = store
        .load_chunks(Some(id))
        .await?
        .into_iter()
        .map(|c| ChunkResponse {
            index: c.chunk_index,
            text: c.text,
        })
        .collect();

    Ok(DocumentResponse { document, chunks })
}

/// CLI entry point for `docrag get`.
pub async fn run_get(config: &Config, id: i64, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let doc = get_document(&store, id).await;
    store.close().await;
    let doc = doc?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("--- Document ---");
    println!("id:          {}", doc.document.id);
    println!("filename:    {}", doc.document.filename);
    println!(
        "title:       {}",
        doc.document.title.as_deref().unwrap_or("(untitled)")
    );
    println!("ingested_at: {}", format_ts_iso(doc.document.ingested_at));
    println!();

    println!("--- Chunks ({}) ---", doc.chunks.len());
    for chunk in &doc.chunks {
        println!("[chunk {}]", chunk.index);
        println!("{}", chunk.text);
        println!();
    }
    Ok(())
}

/// CLI entry point for `docrag docs`.
pub async fn run_docs(config: &Config, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let docs: Vec<DocumentSummary> = store.list_documents().await?;
    store.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("{:>6}  {:>6}  {:<20}  FILENAME", "ID", "CHUNKS", "INGESTED");
    for d in &docs {
        println!(
            "{:>6}  {:>6}  {:<20}  {}",
            d.document.id,
            d.chunk_count,
            format_ts_iso(d.document.ingested_at),
            d.document.filename
        );
    }
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_get_document_with_chunks() {
        let store = InMemoryStore::new();
        let chunks = vec!["uno".to_string(), "dos".to_string()];
        let id = store.create_document("a.pdf", &chunks).await.unwrap();

        let doc = get_document(&store, id).await.unwrap();
        assert_eq!(doc.document.filename, "a.pdf");
        let indices: Vec<i64> = doc.chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(doc.chunks[1].text, "dos");
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = InMemoryStore::new();
        let err = get_document(&store, 42).await.unwrap_err();
        assert!(err.to_string().contains("document not found: 42"));
    }

    #[test]
    fn test_format_ts_iso() {
        assert_eq!(format_ts_iso(0), "1970-01-01T00:00:00Z");
    }
}
