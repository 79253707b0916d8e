use anyhow::Result;
use clap::Parser;
use crawler::{fetch, WebCrawler};
use engine::query::{QueryEngine, ThreadedQueryEngine};
use engine::{json, queue::DEFAULT_THREADS, ConcurrentInvertedIndex, WorkQueue};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "crawler")]
#[command(about = "Crawl the web into a positional inverted index and search it")]
struct Args {
    /// Seed URL to start the crawl from
    #[arg(long)]
    seed: String,
    /// Maximum number of pages to visit, seed included
    #[arg(long, default_value_t = 50)]
    limit: usize,
    /// Maximum redirects followed per fetch
    #[arg(long, default_value_t = fetch::DEFAULT_REDIRECTS)]
    redirects: usize,
    /// Worker threads shared by crawling and querying
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    threads: usize,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "scour-bot/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// Write the index as pretty JSON to this path
    #[arg(long)]
    index_out: Option<PathBuf>,
    /// Write per-page word counts as pretty JSON to this path
    #[arg(long)]
    counts_out: Option<PathBuf>,
    /// Run the query file against the crawled index
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

    let index = Arc::new(ConcurrentInvertedIndex::new());
    let queue = Arc::new(WorkQueue::new(args.threads));
    let client = fetch::client(
        &args.user_agent,
        args.redirects,
        Duration::from_secs(args.timeout_secs),
    )?;

    let web_crawler = WebCrawler::new(Arc::clone(&index), Arc::clone(&queue), client, args.limit);
    web_crawler.crawl(&args.seed)?;
    tracing::info!(
        pages = index.counts().len(),
        words = index.num_words(),
        "crawl complete"
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
