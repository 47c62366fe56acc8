//! Configuration parsing, environment overrides, and validation.
//!
//! docrag is configured by a TOML file (default `./config/docrag.toml`).
//! Every section and key has a default, so a file containing only `[db]`
//! is valid. After the file is parsed, a fixed set of `RAG_*` environment
//! variables override individual values.
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/docrag.sqlite"
//!
//! [chunking]
//! size = 600
//! overlap = 100
//!
//! [retrieval]
//! top_k = 8
//!
//! [context]
//! max_chars = 4000
//! per_chunk_cap = 1200
//!
//! [ocr]
//! enabled = true
//! languages = "spa+eng"
//!
//! [prompt]
//! instructions = "Answer in English."
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Key |
//! |----------|-----|
//! | `RAG_DB_PATH` | `db.path` |
//! | `RAG_CHUNK_SIZE` | `chunking.size` |
//! | `RAG_CHUNK_OVERLAP` | `chunking.overlap` |
//! | `RAG_TOP_K` | `retrieval.top_k` |
//! | `RAG_CONTEXT_CHARS` | `context.max_chars` |
//! | `RAG_PER_CHUNK_MAX_CHARS` | `context.per_chunk_cap` |
//!
//! Unparseable numeric values are ignored and the file value stays.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use docrag_core::context::{ContextBudget, DEFAULT_TAG_OVERHEAD};
use docrag_core::prompt::PromptTemplate;
use docrag_core::rank::Bm25Params;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/docrag.sqlite")
}

/// Word-window chunking parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    600
}
fn default_chunk_overlap() -> usize {
    100
}

/// Ranking parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_b")]
    pub b: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            k1: default_k1(),
            b: default_b(),
            epsilon: default_epsilon(),
        }
    }
}

fn default_top_k() -> i64 {
    8
}
fn default_k1() -> f64 {
    1.5
}
fn default_b() -> f64 {
    0.75
}
fn default_epsilon() -> f64 {
    0.25
}

impl RetrievalConfig {
    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.k1,
            b: self.b,
            epsilon: self.epsilon,
        }
    }
}

/// Context-block budgets, in characters.
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_per_chunk_cap")]
    pub per_chunk_cap: usize,
    #[serde(default = "default_tag_overhead")]
    pub tag_overhead: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            per_chunk_cap: default_per_chunk_cap(),
            tag_overhead: default_tag_overhead(),
        }
    }
}

fn default_max_chars() -> usize {
    4000
}
fn default_per_chunk_cap() -> usize {
    1200
}
fn default_tag_overhead() -> usize {
    DEFAULT_TAG_OVERHEAD
}

impl ContextConfig {
    pub fn budget(&self) -> ContextBudget {
        ContextBudget {
            max_chars: self.max_chars,
            per_chunk_cap: self.per_chunk_cap,
            tag_overhead: self.tag_overhead,
        }
    }
}

/// OCR fallback settings. The external `pdftoppm` and `tesseract`
/// binaries are looked up on `PATH` unless absolute paths are given.
#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ocr_languages")]
    pub languages: String,
    #[serde(default = "default_ocr_dpi")]
    pub dpi: u32,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: PathBuf,
    #[serde(default = "default_tesseract")]
    pub tesseract: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_ocr_enabled(),
            languages: default_ocr_languages(),
            dpi: default_ocr_dpi(),
            pdftoppm: default_pdftoppm(),
            tesseract: default_tesseract(),
        }
    }
}

fn default_ocr_enabled() -> bool {
    true
}
fn default_ocr_languages() -> String {
    "spa+eng".to_string()
}
fn default_ocr_dpi() -> u32 {
    200
}
fn default_pdftoppm() -> PathBuf {
    PathBuf::from("pdftoppm")
}
fn default_tesseract() -> PathBuf {
    PathBuf::from("tesseract")
}

/// Prompt wording. Unset keys keep the built-in Spanish text.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PromptConfig {
    pub system: Option<String>,
    pub instructions: Option<String>,
}

impl PromptConfig {
    pub fn template(&self) -> PromptTemplate {
        let mut template = PromptTemplate::default();
        if let Some(ref system) = self.system {
            template.system = system.clone();
        }
        if let Some(ref instructions) = self.instructions {
            template.instructions = instructions.clone();
        }
        template
    }
}

impl Config {
    /// Apply `RAG_*` overrides read through `lookup`.
    ///
    /// Taking a lookup function keeps tests independent of the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("RAG_DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.db.path = PathBuf::from(path);
        }
        override_parsed(&mut self.chunking.size, lookup("RAG_CHUNK_SIZE"));
        override_parsed(&mut self.chunking.overlap, lookup("RAG_CHUNK_OVERLAP"));
        override_parsed(&mut self.retrieval.top_k, lookup("RAG_TOP_K"));
        override_parsed(&mut self.context.max_chars, lookup("RAG_CONTEXT_CHARS"));
        override_parsed(
            &mut self.context.per_chunk_cap,
            lookup("RAG_PER_CHUNK_MAX_CHARS"),
        );
    }

    /// Resolve a caller-supplied `top_k`, falling back to the configured
    /// default when it is absent or not an integer.
    pub fn resolve_top_k(&self, raw: Option<&str>) -> i64 {
        parse_or(raw, self.retrieval.top_k)
    }

    /// Resolve a caller-supplied context budget, falling back to the
    /// configured default when it is absent or not a non-negative integer.
    pub fn resolve_max_chars(&self, raw: Option<&str>) -> usize {
        parse_or(raw, self.context.max_chars)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 {
            anyhow::bail!("chunking.size must be > 0");
        }
        if self.context.tag_overhead >= self.context.max_chars {
            anyhow::bail!(
                "context.tag_overhead ({}) must be smaller than context.max_chars ({})",
                self.context.tag_overhead,
                self.context.max_chars
            );
        }
        if self.retrieval.k1 < 0.0 {
            anyhow::bail!("retrieval.k1 must be >= 0.0");
        }
        if !(0.0..=1.0).contains(&self.retrieval.b) {
            anyhow::bail!("retrieval.b must be in [0.0, 1.0]");
        }
        Ok(())
    }
}

fn override_parsed<T: FromStr>(slot: &mut T, raw: Option<String>) {
    if let Some(value) = raw.and_then(|s| s.trim().parse::<T>().ok()) {
        *slot = value;
    }
}

/// Parse `raw` as `T`, or return `default` when absent or malformed.
pub fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Load a config file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}
