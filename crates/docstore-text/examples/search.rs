use std::env;
use std::path::PathBuf;

use docstore_core::config::TextConfig;
use docstore_core::ingest::RecordLoader;
use docstore_core::traits::TermIndexer;
use docstore_text::{TermIndex, Tokenizer};

// Index a directory of .json/.jsonl records in memory and run one keyword query.
// Usage:
//   cargo run -p docstore-text --example search -- "your query" \
//     [--data ./records] [--limit 10] [--stop-words]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: cargo run -p docstore-text --example search -- <query> [--data DIR] [--limit N] [--stop-words]");
        std::process::exit(1);
    }
    let mut query = String::new();
    let mut data_dir: Option<PathBuf> = None;
    let mut limit: usize = 10;
    let mut stop_words = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data" => {
                if i + 1 >= args.len() { eprintln!("--data requires a path"); std::process::exit(2); }
                data_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--limit" => {
                if i + 1 >= args.len() { eprintln!("--limit requires a number"); std::process::exit(2); }
                limit = args[i + 1].parse().unwrap_or(limit);
                i += 2; continue;
            }
            "--stop-words" => { stop_words = true; i += 1; continue; }
            s if s.starts_with("--") => {
                eprintln!("Unknown flag: {}", s); std::process::exit(2);
            }
            s => {
                if query.is_empty() { query = s.to_string(); }
                i += 1; continue;
            }
        }
    }

    if query.is_empty() {
        eprintln!("Missing <query> argument");
        std::process::exit(1);
    }

    // flag > DOCSTORE_RECORDS_DIR > current directory
    let data_dir = data_dir
        .or_else(|| env::var("DOCSTORE_RECORDS_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let loaded = RecordLoader::new().load_directory(&data_dir)?;
    let index = TermIndex::in_memory(Tokenizer::new(&TextConfig { stop_words }));
    let mut contents = Vec::with_capacity(loaded.records.len());
    for (n, (location, record)) in loaded.records.into_iter().enumerate() {
        let id = docstore_core::DocId::new(n as u64 + 1);
        index.index(id, &record.content)?;
        contents.push((id, location, record.content));
    }

    println!("Keyword search\n==============");
    println!("Records: {} ({} documents, {} terms)", data_dir.display(), index.len(), index.term_count());
    println!("Query: {} (limit {})\n", query, limit);

    let hits = index.search(&query)?;
    for (i, h) in hits.iter().take(limit).enumerate() {
        let Some((_, location, content)) = contents.iter().find(|(id, _, _)| *id == h.id) else { continue };
        let snippet: String = content.chars().take(80).collect();
        println!("{:>2}. score={:.0} id={} at={}\n    {}", i + 1, h.score, h.id, location, snippet);
    }
    if hits.is_empty() { println!("No matching data found"); }

    Ok(())
}
