//! Query commands: ranked search, context assembly, and prompt rendering.
//!
//! Numeric flags arrive as raw strings and are parsed leniently: a value
//! that is not a number falls back to the configured default instead of
//! failing the command.

use anyhow::Result;

use docrag_core::models::RetrievedChunk;

use crate::config::Config;
use crate::pipeline::{Pipeline, PreparedPrompt, QueryOptions};
use crate::sqlite_store::SqliteStore;

/// Raw query flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub top_k: Option<String>,
    pub max_chars: Option<String>,
    pub document_id: Option<i64>,
}

impl QueryArgs {
    pub fn resolve(&self, config: &Config) -> QueryOptions {
        QueryOptions {
            top_k: Some(config.resolve_top_k(self.top_k.as_deref())),
            max_chars: Some(config.resolve_max_chars(self.max_chars.as_deref())),
            document_id: self.document_id,
        }
    }
}

/// Run retrieval through context assembly and prompt rendering.
pub async fn prepare(config: &Config, query: &str, args: &QueryArgs) -> Result<PreparedPrompt> {
    let store = SqliteStore::open(config).await?;
    let pipeline = Pipeline::new(store, config);
    let prepared = pipeline.prepare(query, &args.resolve(config)).await;
    pipeline.store().close().await;
    prepared
}

/// CLI entry point for `docrag search`.
pub async fn run_search(config: &Config, query: &str, args: &QueryArgs, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let pipeline = Pipeline::new(store, config);
    let top_k = config.resolve_top_k(args.top_k.as_deref());
    let results = pipeline.retrieve(query, top_k, args.document_id).await?;
    pipeline.store().close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, chunk) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] doc={} chunk={}",
            i + 1,
            chunk.score,
            chunk.document_id,
            chunk.chunk_index
        );
        println!("    {}", snippet(chunk, 200));
        println!();
    }
    Ok(())
}

/// CLI entry point for `docrag context`.
pub async fn run_context(config: &Config, query: &str, args: &QueryArgs) -> Result<()> {
    let prepared = prepare(config, query, args).await?;
    println!("{}", prepared.context);
    Ok(())
}

/// CLI entry point for `docrag prompt`.
pub async fn run_prompt(config: &Config, query: &str, args: &QueryArgs) -> Result<()> {
    let prepared = prepare(config, query, args).await?;
    println!("{}", prepared.prompt);
    Ok(())
}

fn snippet(chunk: &RetrievedChunk, max: usize) -> String {
    let mut s: String = chunk.text.chars().take(max).collect();
    if chunk.text.chars().count() > max {
        s.push_str("...");
    }
    s
}
