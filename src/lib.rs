//! # docrag
//!
//! PDF ingestion and retrieval for retrieval-augmented generation.
//!
//! docrag turns uploaded PDFs into overlapping word-window chunks stored in
//! SQLite, ranks those chunks against a question with Okapi BM25, and packs
//! the best ones into a tagged, size-bounded context block for an external
//! text generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  PDF bytes  │──▶│  Extractor  │──▶│ Chunker  │
//! └─────────────┘   │ lopdf/pdf-  │   └────┬─────┘
//!                   │ extract/OCR │        ▼
//!                   └─────────────┘   ┌──────────┐
//!                                     │  SQLite  │
//!                                     └────┬─────┘
//!                        query ──▶ BM25    │
//!                                  Ranker ◀┘
//!                                    │
//!                                    ▼
//!                            Context Assembler ──▶ prompt
//! ```
//!
//! The pure pieces (chunking, ranking, context assembly, the `Store` trait)
//! live in the `docrag-core` crate; this crate adds SQLite persistence, PDF
//! extraction, configuration and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! docrag init
//! docrag ingest manual.pdf
//! docrag search "garantía del producto"
//! docrag prompt "¿Cuánto dura la garantía?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and `RAG_*` overrides |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`extract`] | PDF text extraction strategies |
//! | [`pipeline`] | Ingest, retrieve, assemble, answer |
//! | [`ingest`] | `ingest` and `extract` commands |
//! | [`search`] | `search`, `context` and `prompt` commands |
//! | [`get`] | `docs` and `get` commands |

pub mod config;
pub mod db;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod pipeline;
pub mod search;
pub mod sqlite_store;
