//! docstore CLI
//!
//! ```bash
//! docstore ingest ./records            # load .json / .jsonl record files
//! docstore keyword "machine learning" --limit 5
//! docstore semantic --embedding "[0.1, 0.2, 0.3]" -k 3
//! docstore get 42
//! docstore stats
//! ```
//!
//! Store settings come from `config.toml` / `APP_STORE__*`; `--data-dir`
//! and `--dimension` override them.

mod output;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docstore_core::config::{Config, StoreConfig};
use docstore_core::ingest::RecordLoader;
use docstore_core::DocId;
use docstore_hybrid::DefaultStore;

use output::{DocumentView, RESULTS};

const INGEST_BATCH: usize = 100;

/// Hybrid keyword + vector document store.
#[derive(Parser)]
#[command(name = "docstore", version, about)]
struct Cli {
    /// Directory holding records.log / terms.log (default: config `store.data_dir`)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Embedding dimension (default: config `store.dimension`, else first document)
    #[arg(long, global = true)]
    dimension: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store every record found under a directory
    Ingest {
        dir: PathBuf,
        /// Only read the first N record files
        #[arg(long)]
        limit_files: Option<usize>,
    },
    /// Keyword query: words are ANDed, "quoted phrases", -exclude, OR
    Keyword {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Cosine similarity search with a query embedding
    Semantic {
        /// JSON array of numbers
        #[arg(long, conflicts_with = "embedding_file")]
        embedding: Option<String>,
        /// File containing a JSON array of numbers
        #[arg(long)]
        embedding_file: Option<PathBuf>,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Print one document
    Get { id: DocId },
    /// Index any stored document missing from the indexes
    Reindex,
    /// Document, term and vector counts
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = store_config(&cli)?;
    let store = DefaultStore::open(&config).context("opening store")?;

    let rendered = match cli.command {
        Command::Ingest { dir, limit_files } => ingest(&store, &dir, limit_files)?,
        Command::Keyword { query, limit } => {
            let found = match limit {
                Some(limit) => store.keyword_search_top(&query, limit),
                None => store.keyword_search(&query),
            };
            match found {
                Ok(docs) => output::render(RESULTS, docs.iter().map(|d| DocumentView::from_document(d)).collect::<Vec<_>>())?,
                Err(e) if e.is_not_found() => output::no_match()?,
                Err(e) => return Err(e.into()),
            }
        }
        Command::Semantic { embedding, embedding_file, k } => {
            let raw = match (embedding, embedding_file) {
                (Some(raw), _) => raw,
                (None, Some(path)) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("one of --embedding or --embedding-file is required"),
            };
            let query: Vec<f32> = serde_json::from_str(&raw).context("embedding must be a JSON array of numbers")?;
            match store.semantic_search_top(&query, k.unwrap_or(store.default_k())) {
                Ok(scored) => output::render(RESULTS, scored.iter().map(DocumentView::from_scored).collect::<Vec<_>>())?,
                Err(e) if e.is_not_found() => output::no_match()?,
                Err(e) => return Err(e.into()),
            }
        }
        Command::Get { id } => match store.get(id) {
            Ok(doc) => output::render("Document", DocumentView::from_document(&doc))?,
            Err(e) if e.is_not_found() => output::no_match()?,
            Err(e) => return Err(e.into()),
        },
        Command::Reindex => output::render("Reindexed", serde_json::json!({ "repaired": store.reindex()? }))?,
        Command::Stats => output::render("Store stats", store.stats())?,
    };
    println!("{rendered}");
    Ok(())
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = Config::load()?.store()?;
    if let Some(dir) = &cli.data_dir { config.data_dir = Some(dir.clone()); }
    if let Some(dimension) = cli.dimension { config.dimension = Some(dimension); }
    Ok(config)
}

fn ingest(store: &DefaultStore, dir: &std::path::Path, limit_files: Option<usize>) -> Result<String> {
    let loader = RecordLoader::new();
    let loaded = match limit_files {
        Some(limit) => loader.load_directory_limited(dir, limit)?,
        None => loader.load_directory(dir)?,
    };
    for bad in &loaded.rejected {
        tracing::warn!(at = %bad.location, reason = %bad.reason, "unreadable record");
    }

    let pb = ProgressBar::new(loaded.records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%)")?
            .progress_chars("#>-"),
    );

    let mut stored = 0usize;
    let mut rejected: Vec<serde_json::Value> = loaded
        .rejected
        .iter()
        .map(|r| serde_json::json!({ "at": r.location.to_string(), "reason": r.reason }))
        .collect();
    for chunk in loaded.records.chunks(INGEST_BATCH) {
        let report = store.store_batch(chunk.iter().map(|(_, doc)| doc.clone()))?;
        stored += report.stored.len();
        for (position, reason) in report.rejected {
            let at = chunk.get(position).map(|(location, _)| location.to_string()).unwrap_or_default();
            tracing::warn!(%at, %reason, "record rejected");
            rejected.push(serde_json::json!({ "at": at, "reason": reason }));
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();
    tracing::info!(stored, rejected = rejected.len(), "ingest finished");

    output::render("Ingest finished", serde_json::json!({ "stored": stored, "rejected": rejected }))
}
