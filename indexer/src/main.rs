use anyhow::Result;
use clap::Parser;
use engine::builder::IndexBuilder;
use engine::query::{QueryEngine, SerialQueryEngine, ThreadedQueryEngine};
use engine::{json, ConcurrentInvertedIndex, InvertedIndex, WorkQueue};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional inverted index from text files and search it")]
struct Args {
    /// Directory (or single file) of plain-text documents to index
    #[arg(long)]
    input: PathBuf,
    /// Worker threads; 0 builds and searches on the calling thread
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Write the index as pretty JSON to this path
    #[arg(long)]
    index_out: Option<PathBuf>,
    /// Write per-file word counts as pretty JSON to this path
    #[arg(long)]
    counts_out: Option<PathBuf>,
    /// Run the query file against the built index
    #[arg(long)]
    queries: Option<PathBuf>,
    /// Use exact search instead of partial search
    #[arg(long, default_value_t = false)]
    exact: bool,
    /// Write ranked results as pretty JSON to this path
    #[arg(long)]
    results_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    if args.threads == 0 {
        run_serial(&args)
    } else {
        run_parallel(&args)
    }
}

fn run_serial(args: &Args) -> Result<()> {
    let mut index = InvertedIndex::new();
    IndexBuilder::new().build(&args.input, &mut index);
    tracing::info!(
        files = index.counts().len(),
        words = index.num_words(),
        "index built"
    );

    if let Some(path) = &args.index_out {
        json::write_index(&index, path)?;
    }
    if let Some(path) = &args.counts_out {
        json::write_counts(index.counts(), path)?;
    }
    if let Some(path) = &args.queries {
        let mut search = SerialQueryEngine::new(&index);
        search.handle_queries(path, args.exact)?;
        if let Some(out) = &args.results_out {
            json::write_results(&search.result_map(), out)?;
        }
    }
    Ok(())
}

fn run_parallel(args: &Args) -> Result<()> {
    let index = Arc::new(ConcurrentInvertedIndex::new());
    let queue = Arc::new(WorkQueue::new(args.threads));
    IndexBuilder::new().build_parallel(&args.input, &index, &queue);
    tracing::info!(
        files = index.counts().len(),
        words = index.num_words(),
        threads = args.threads,
        "index built"
    );

    if let Some(path) = &args.index_out {
        json::write_index(&index.read(), path)?;
    }
    if let Some(path) = &args.counts_out {
        json::write_counts(&index.counts(), path)?;
    }
    if let Some(path) = &args.queries {
        let mut search = ThreadedQueryEngine::new(Arc::clone(&index), Arc::clone(&queue));
        search.handle_queries(path, args.exact)?;
        if let Some(out) = &args.results_out {
            json::write_results(&search.result_map(), out)?;
        }
    }
    queue.shutdown();
    Ok(())
}
