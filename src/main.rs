//! # docrag CLI
//!
//! ## Usage
//!
//! ```bash
//! docrag --config ./config/docrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docrag init` | Create the SQLite database and run schema migrations |
//! | `docrag ingest <file>...` | Extract, chunk and store PDFs |
//! | `docrag search "<query>"` | Rank stored chunks with BM25 |
//! | `docrag context "<query>"` | Print the assembled context block |
//! | `docrag prompt "<query>"` | Print the full generator prompt |
//! | `docrag docs` | List documents with chunk counts |
//! | `docrag get <id>` | Show a document and its chunks |
//! | `docrag extract <file>` | Print extracted text without storing it |
//!
//! Logs go to stderr; set `RUST_LOG=docrag=debug` to see extraction
//! strategy decisions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docrag::search::QueryArgs;
use docrag::{config, get, ingest, migrate, search};

/// docrag: PDF ingestion and BM25 retrieval for retrieval-augmented
/// generation.
#[derive(Parser)]
#[command(
    name = "docrag",
    about = "PDF ingestion and BM25 retrieval for retrieval-augmented generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Ingest one or more PDF files.
    ///
    /// A PDF with no extractable text is stored with zero chunks and a
    /// warning rather than rejected.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print reports as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank stored chunks against a query.
    Search {
        query: String,

        #[command(flatten)]
        query_args: QueryFlags,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the context block that would be handed to a generator.
    Context {
        query: String,

        #[command(flatten)]
        query_args: QueryFlags,
    },

    /// Print the full generator prompt for a query.
    Prompt {
        query: String,

        #[command(flatten)]
        query_args: QueryFlags,
    },

    /// List ingested documents.
    Docs {
        #[arg(long)]
        json: bool,
    },

    /// Show a document and all of its chunks.
    Get {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Extract text from a PDF without storing it.
    Extract { file: PathBuf },
}

/// Retrieval flags shared by `search`, `context` and `prompt`.
#[derive(clap::Args)]
struct QueryFlags {
    /// Number of chunks to retrieve. Non-numeric values use the configured default.
    #[arg(long, allow_hyphen_values = true)]
    top_k: Option<String>,

    /// Context budget in characters. Non-numeric values use the configured default.
    #[arg(long, allow_hyphen_values = true)]
    max_chars: Option<String>,

    /// Restrict retrieval to one document.
    #[arg(long = "doc")]
    doc: Option<i64>,
}

impl From<QueryFlags> for QueryArgs {
    fn from(flags: QueryFlags) -> Self {
        QueryArgs {
            top_k: flags.top_k,
            max_chars: flags.max_chars,
            document_id: flags.doc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { files, json } => {
            ingest::run_ingest(&cfg, &files, json).await?;
        }
        Commands::Search {
            query,
            query_args,
            json,
        } => {
            search::run_search(&cfg, &query, &query_args.into(), json).await?;
        }
        Commands::Context { query, query_args } => {
            search::run_context(&cfg, &query, &query_args.into()).await?;
        }
        Commands::Prompt { query, query_args } => {
            search::run_prompt(&cfg, &query, &query_args.into()).await?;
        }
        Commands::Docs { json } => {
            get::run_docs(&cfg, json).await?;
        }
        Commands::Get { id, json } => {
            get::run_get(&cfg, id, json).await?;
        }
        Commands::Extract { file } => {
            ingest::run_extract(&cfg, &file).await?;
        }
    }

    Ok(())
}
