//! PDF ingestion commands.
//!
//! `docrag ingest` reads every file up front, then runs each through the
//! [`Pipeline`] in the order given and prints one report per document. A
//! file that cannot be read stops the run before anything is stored. A
//! storage failure mid-run stops it too, but documents committed before the
//! failure stay stored.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::extract::Extractor;
use crate::pipeline::{IngestReport, Pipeline};
use crate::sqlite_store::SqliteStore;

/// Ingest PDFs and return their reports.
pub async fn ingest_files(config: &Config, files: &[PathBuf]) -> Result<Vec<IngestReport>> {
    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push((display_name(path), bytes));
    }

    let store = SqliteStore::open(config).await?;
    let pipeline = Pipeline::new(store, config);

    let mut reports = Vec::with_capacity(inputs.len());
    for (name, bytes) in inputs {
        let report = pipeline.ingest(&name, bytes).await?;
        reports.push(report);
    }

    pipeline.store().close().await;
    Ok(reports)
}

/// CLI entry point for `docrag ingest`.
pub async fn run_ingest(config: &Config, files: &[PathBuf], json: bool) -> Result<()> {
    let reports = ingest_files(config, files).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{}", report.filename);
        println!("  document_id: {}", report.document_id);
        println!("  chunks:      {}", report.chunk_count);
        if let Some(strategy) = report.strategy {
            println!("  extracted:   {}", strategy);
        }
        if let Some(ref warning) = report.warning {
            println!("  warning:     {}", warning);
        }
    }
    let total: i64 = reports.iter().map(|r| r.chunk_count).sum();
    println!("{} document(s), {} chunk(s) stored.", reports.len(), total);
    Ok(())
}

/// CLI entry point for `docrag extract`: run extraction only, store nothing.
pub async fn run_extract(config: &Config, file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let extractor = Extractor::from_config(&config.ocr);
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .context("extraction task failed")?;

    match extraction.strategy {
        Some(strategy) => eprintln!("strategy: {}", strategy),
        None => eprintln!("strategy: none (no text extracted)"),
    }
    println!("{}", extraction.text);
    Ok(())
}

/// The name recorded for a file: its final path component.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
