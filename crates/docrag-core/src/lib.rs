//! # docrag core
//!
//! Storage-agnostic logic for docrag: data models, whitespace normalization
//! and tokenization, word-window chunking, BM25 ranking, context assembly,
//! prompt building, and the [`store::Store`] abstraction.
//!
//! This crate has no sqlx, no process spawning, and no filesystem I/O.
//! PDF extraction and the SQLite backend live in the `docrag` crate.

pub mod chunk;
pub mod context;
pub mod models;
pub mod prompt;
pub mod rank;
pub mod store;
pub mod text;
