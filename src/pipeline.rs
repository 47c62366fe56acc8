//! Ingestion and retrieval pipeline.
//!
//! A [`Pipeline`] wires the components together around one [`Store`]:
//!
//! ```text
//! bytes ──▶ Extractor ──▶ Chunker ──▶ Store
//!                                       │
//! query ──────────────▶ Ranker ◀────────┘
//!                          │
//!                          ▼
//!                  ContextAssembler ──▶ prompt ──▶ Generator
//! ```
//!
//! Ingestion runs extraction on the blocking thread pool, then writes the
//! document and its chunks in one store call. Retrieval loads the candidate
//! chunks and rebuilds the BM25 model from them on every query.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use docrag_core::chunk::Chunker;
use docrag_core::context::ContextAssembler;
use docrag_core::models::RetrievedChunk;
use docrag_core::prompt::{Generator, PromptTemplate};
use docrag_core::rank::Ranker;
use docrag_core::store::Store;

use crate::config::Config;
use crate::extract::Extractor;

/// Advisory attached to an ingestion that produced no chunks.
pub const NO_TEXT_WARNING: &str =
    "no text could be extracted from the PDF; it may be scanned or protected";

/// Outcome of ingesting one PDF.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: i64,
    pub filename: String,
    pub chunk_count: i64,
    /// Extraction strategy that produced the text, if any did.
    pub strategy: Option<&'static str>,
    pub warning: Option<String>,
}

/// Per-query knobs. `None` fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub top_k: Option<i64>,
    pub max_chars: Option<usize>,
    pub document_id: Option<i64>,
}

/// A generated answer with the retrieval trace that fed it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub chunks: Vec<RetrievedChunk>,
    pub context_chars: usize,
    pub top_k: i64,
}

/// Everything a generator needs, before the generator is called.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub context: String,
    pub chunks: Vec<RetrievedChunk>,
    pub top_k: i64,
}

pub struct Pipeline<S> {
    store: S,
    extractor: Arc<Extractor>,
    chunker: Chunker,
    ranker: Ranker,
    assembler: ContextAssembler,
    template: PromptTemplate,
    default_top_k: i64,
}

impl<S: Store> Pipeline<S> {
    /// Build a pipeline with the default extraction chain for `config`.
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            extractor: Arc::new(Extractor::from_config(&config.ocr)),
            chunker: Chunker::new(config.chunking.size, config.chunking.overlap),
            ranker: Ranker::new(config.retrieval.bm25_params()),
            assembler: ContextAssembler::new(config.context.budget()),
            template: config.prompt.template(),
            default_top_k: config.retrieval.top_k,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract, chunk, and persist one PDF.
    ///
    /// A PDF with no extractable text is still recorded, with zero chunks
    /// and a warning. Only persistence failures are errors.
    pub async fn ingest(&self, filename: &str, bytes: Vec<u8>) -> Result<IngestReport> {
        let extractor = Arc::clone(&self.extractor);
        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .context("extraction task failed")?;

        let chunks = self.chunker.chunk(&extraction.text);
        let document_id = self
            .store
            .create_document(filename, &chunks)
            .await
            .with_context(|| format!("Failed to store {}", filename))?;
        let chunk_count = self.store.count_chunks(document_id).await?;

        let warning = if chunk_count == 0 {
            tracing::warn!(document_id, filename, "{}", NO_TEXT_WARNING);
            Some(NO_TEXT_WARNING.to_string())
        } else {
            tracing::info!(document_id, filename, chunk_count, "document ingested");
            None
        };

        Ok(IngestReport {
            document_id,
            filename: filename.to_string(),
            chunk_count,
            strategy: extraction.strategy,
            warning,
        })
    }

    /// Rank stored chunks against `query` and keep the best `top_k`.
    ///
    /// `scope` limits candidates to one document. Empty stores, unknown
    /// documents and `top_k <= 0` all yield an empty list.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: i64,
        scope: Option<i64>,
    ) -> Result<Vec<RetrievedChunk>> {
        if top_k <= 0 {
            return Ok(Vec::new());
        }
        let candidates = self.store.load_chunks(scope).await?;
        let candidate_count = candidates.len();
        let ranked = self.ranker.rank(query, candidates, top_k);
        tracing::debug!(candidate_count, returned = ranked.len(), top_k, "retrieval done");
        Ok(ranked)
    }

    /// Assemble ranked chunks into a tagged context block.
    pub fn build_context(&self, chunks: &[RetrievedChunk], max_chars: Option<usize>) -> String {
        match max_chars {
            Some(limit) => self.assembler.assemble_with_limit(chunks, limit),
            None => self.assembler.assemble(chunks),
        }
    }

    /// Retrieve, assemble, and render the generator prompt for `query`.
    pub async fn prepare(&self, query: &str, options: &QueryOptions) -> Result<PreparedPrompt> {
        let top_k = options.top_k.unwrap_or(self.default_top_k);
        let chunks = self.retrieve(query, top_k, options.document_id).await?;
        let context = self.build_context(&chunks, options.max_chars);
        let prompt = self.template.render(query, &context);
        Ok(PreparedPrompt {
            prompt,
            context,
            chunks,
            top_k,
        })
    }

    /// Full question answering: retrieval, context, prompt, generation.
    pub async fn answer(
        &self,
        query: &str,
        generator: &dyn Generator,
        options: &QueryOptions,
    ) -> Result<Answer> {
        let prepared = self.prepare(query, options).await?;
        let text = generator
            .generate(&prepared.prompt)
            .await
            .context("generator failed")?;

        Ok(Answer {
            text,
            context_chars: prepared.context.chars().count(),
            chunks: prepared.chunks,
            top_k: prepared.top_k,
        })
    }
}
