//! Command-line entry point: build an index from a MediaWiki XML dump,
//! or search one already built.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use wikidex::config::{IndexerConfig, StoreConfig};
use wikidex::index::{tokenizer, Indexer, InvertedIndex};
use wikidex::search::scoring::ScoreKind;
use wikidex::search::Searcher;
use wikidex::source::WikiSource;
use wikidex::storage::Store;

#[derive(Parser)]
#[command(name = "wikidex-cli", about = "Full-text index and search over a MediaWiki XML dump")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an index from a MediaWiki XML dump.
    Build {
        xml_path: PathBuf,
        #[arg(long, default_value = "./wiki_jieba.db")]
        db: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "whitespace")]
        tokenizer: String,
    },
    /// Search a previously built index.
    Search {
        db: PathBuf,
        query: String,
        #[arg(long, default_value = "bm25")]
        score: String,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value = "whitespace")]
        tokenizer: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { xml_path, db, limit, tokenizer: tok_name } => run_build(&xml_path, &db, limit, &tok_name),
        Command::Search { db, query, score, top, tokenizer: tok_name } => {
            run_search(&db, &query, &score, top, &tok_name)
        }
    }
}

fn run_build(xml_path: &PathBuf, db: &PathBuf, limit: Option<usize>, tok_name: &str) -> Result<()> {
    let tok = tokenizer::from_name(tok_name).ok_or_else(|| anyhow!("unknown tokenizer '{tok_name}'"))?;
    let store = Arc::new(Store::open(db, StoreConfig::default()).context("opening store")?);
    let source = WikiSource::open(xml_path, limit).context("opening XML source")?;
    let mut indexer = Indexer::new(store.clone(), tok, IndexerConfig::default());

    let start = Instant::now();
    for page in source.iter() {
        let mut doc = page.context("reading page from source")?;
        indexer.add_doc(&mut doc).context("indexing document")?;
    }

    let (index, stats) = indexer.build();
    index.write_to(&store).context("writing residual index state")?;
    store.close().context("closing store")?;

    println!(
        "indexed {} docs ({} distinct tokens, {} spills) in {:.2}s -> {}",
        stats.docs_indexed,
        stats.distinct_tokens,
        stats.spills,
        start.elapsed().as_secs_f64(),
        db.display(),
    );
    Ok(())
}

fn run_search(db: &PathBuf, query: &str, score: &str, top: usize, tok_name: &str) -> Result<()> {
    let kind = ScoreKind::from_name(score).ok_or_else(|| anyhow!("unknown score function '{score}'"))?;
    let tok = tokenizer::from_name(tok_name).ok_or_else(|| anyhow!("unknown tokenizer '{tok_name}'"))?;
    let store = Arc::new(Store::open(db, StoreConfig::default()).context("opening store")?);
    let index = InvertedIndex::load(&store);
    let searcher = Searcher::new(store, tok, index);

    let hits = searcher.search(query, kind, top).context("searching")?;
    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        let title = hit.doc.fields.get("Title").map(String::as_str).unwrap_or("(untitled)");
        println!("{:>3}. [{:.4}] {} (doc #{})", rank + 1, hit.score, title, hit.doc_id);
    }
    Ok(())
}
