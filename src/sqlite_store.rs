//! SQLite-backed [`Store`] implementation.
//!
//! Each document is written in one transaction: the `documents` row and
//! every `chunks` row commit together or not at all. Chunk indices are
//! assigned from the position in the slice handed to
//! [`create_document`](Store::create_document), so concurrent ingestions of
//! different documents cannot disturb each other's sequences.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use docrag_core::models::{Document, DocumentSummary, StoredChunk};
use docrag_core::store::Store;

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        filename: row.get("filename"),
        title: row.get("title"),
        ingested_at: row.get("ingested_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_document(&self, filename: &str, chunks: &[String]) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO documents (filename, title, ingested_at) VALUES (?, ?, ?)")
            .bind(filename)
            .bind(Option::<String>::None)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert document row for {}", filename))?;
        let doc_id = result.last_insert_rowid();

        for (i, text) in chunks.iter().enumerate() {
            sqlx::query("INSERT INTO chunks (document_id, chunk_index, text) VALUES (?, ?, ?)")
                .bind(doc_id)
                .bind(i as i64)
                .bind(text)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert chunk {} of document {}", i, doc_id))?;
        }

        // Dropping `tx` on any error above rolls the whole document back.
        tx.commit().await?;
        tracing::debug!(doc_id, chunks = chunks.len(), "document committed");
        Ok(doc_id)
    }

    async fn load_chunks(&self, document_id: Option<i64>) -> Result<Vec<StoredChunk>> {
        let rows = match document_id {
            None => {
                sqlx::query("SELECT document_id, chunk_index, text FROM chunks ORDER BY id ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(id) => {
                sqlx::query(
                    "SELECT document_id, chunk_index, text FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| StoredChunk {
                document_id: row.get("document_id"),
                chunk_index: row.get("chunk_index"),
                text: row.get("text"),
            })
            .collect())
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, filename, title, ingested_at FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.filename, d.title, d.ingested_at, COUNT(c.id) AS chunk_count
            FROM documents d
            LEFT JOIN chunks c ON c.document_id = d.id
            GROUP BY d.id
            ORDER BY d.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DocumentSummary {
                document: document_from_row(row),
                chunk_count: row.get("chunk_count"),
            })
            .collect())
    }

    async fn count_chunks(&self, document_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().join("data").join("test.sqlite");
        let store = SqliteStore::open(&config).await.unwrap();
        (tmp, store)
    }

    fn texts(n: usize, prefix: &str) -> Vec<String> {
        (0..n).map(|i| format!("{} chunk {}", prefix, i)).collect()
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let (_tmp, store) = open_temp().await;
        let a = store.create_document("a.pdf", &texts(3, "a")).await.unwrap();
        let b = store.create_document("b.pdf", &texts(2, "b")).await.unwrap();

        let scoped = store.load_chunks(Some(b)).await.unwrap();
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[0].chunk_index, 0);
        assert_eq!(scoped[1].text, "b chunk 1");

        let all = store.load_chunks(None).await.unwrap();
        let ids: Vec<(i64, i64)> = all.iter().map(|c| (c.document_id, c.chunk_index)).collect();
        assert_eq!(ids, vec![(a, 0), (a, 1), (a, 2), (b, 0), (b, 1)]);
    }

    #[tokio::test]
    async fn test_document_metadata() {
        let (_tmp, store) = open_temp().await;
        let before = chrono::Utc::now().timestamp();
        let id = store.create_document("report.pdf", &[]).await.unwrap();
        let doc = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(doc.filename, "report.pdf");
        assert!(doc.title.is_none());
        assert!(doc.ingested_at >= before);
        assert_eq!(store.count_chunks(id).await.unwrap(), 0);
        assert!(store.get_document(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_documents_with_counts() {
        let (_tmp, store) = open_temp().await;
        store.create_document("a.pdf", &texts(4, "a")).await.unwrap();
        store.create_document("empty.pdf", &[]).await.unwrap();
        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].chunk_count, 4);
        assert_eq!(docs[1].document.filename, "empty.pdf");
        assert_eq!(docs[1].chunk_count, 0);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_nothing_behind() {
        let (_tmp, store) = open_temp().await;
        // A trigger that rejects one specific chunk forces a mid-transaction failure.
        sqlx::query(
            r#"
            CREATE TRIGGER reject_poison BEFORE INSERT ON chunks
            WHEN NEW.text = 'poison'
            BEGIN SELECT RAISE(ABORT, 'poisoned chunk'); END
            "#,
        )
        .execute(store.pool())
        .await
        .unwrap();

        let chunks = vec!["fine".to_string(), "poison".to_string()];
        assert!(store.create_document("bad.pdf", &chunks).await.is_err());
        assert!(store.list_documents().await.unwrap().is_empty());
        assert!(store.load_chunks(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_ingestion_keeps_index_sequences() {
        let (_tmp, store) = open_temp().await;
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for d in 0..6 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let name = format!("doc{}.pdf", d);
                store
                    .create_document(&name, &texts(5 + d, &name))
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        for id in ids {
            let chunks = store.load_chunks(Some(id)).await.unwrap();
            let indices: Vec<i64> = chunks.iter().map(|c| c.chunk_index).collect();
            let expected: Vec<i64> = (0..chunks.len() as i64).collect();
            assert_eq!(indices, expected);
            assert!(!chunks.is_empty());
        }
    }
}
