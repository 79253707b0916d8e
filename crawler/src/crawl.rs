use crate::{clean, fetch, links};
use anyhow::Result;
use engine::text::WordStemmer;
use engine::{ConcurrentInvertedIndex, InvertedIndex, WorkQueue};
use parking_lot::Mutex;
use reqwest::blocking::Client;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Concurrent, limit-bounded web crawler. Every fetched page is cleaned,
/// stemmed, indexed into a private index keyed by its canonical URL, and
/// merged into the shared index; discovered links fan out as new fetch
/// tasks while the frontier stays below the page limit.
///
/// The frontier is scoped to a single `crawl` invocation and counts the
/// seed, so a limit of N visits at most N pages. It lives behind its own
/// lock, which is never held together with the index lock.
pub struct WebCrawler {
    shared: Arc<CrawlState>,
}

struct CrawlState {
    index: Arc<ConcurrentInvertedIndex>,
    queue: Arc<WorkQueue>,
    client: Client,
    stemmer: WordStemmer,
    limit: usize,
    frontier: Mutex<HashSet<String>>,
}

impl WebCrawler {
    pub fn new(
        index: Arc<ConcurrentInvertedIndex>,
        queue: Arc<WorkQueue>,
        client: Client,
        limit: usize,
    ) -> Self {
        Self {
            shared: Arc::new(CrawlState {
                index,
                queue,
                client,
                stemmer: WordStemmer::default(),
                limit: limit.max(1),
                frontier: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Crawls from the seed URL until the page limit is reached and every
    /// fetch task has drained. Fails only on an unparseable seed; per-page
    /// failures are logged and skipped.
    pub fn crawl(&self, seed: &str) -> Result<()> {
        let seed = Url::parse(seed)?;
        {
            let mut frontier = self.shared.frontier.lock();
            frontier.clear();
            frontier.insert(links::canonical(&seed));
        }
        CrawlState::submit(&self.shared, seed);
        self.shared.queue.finish();
        let visited = self.shared.frontier.lock().len();
        tracing::info!(visited, "crawl drained");
        self.shared.frontier.lock().clear();
        Ok(())
    }
}

impl CrawlState {
    fn submit(state: &Arc<CrawlState>, url: Url) {
        let task_state = Arc::clone(state);
        state.queue.execute(move || task_state.visit(&url));
    }

    fn visit(self: Arc<CrawlState>, url: &Url) {
        let html = match fetch::fetch(&self.client, url) {
            Some(html) => html,
            None => return,
        };

        // links must come out of the block-stripped html, before the
        // anchor tags themselves are removed
        let stripped = clean::strip_blocks(&html);
        let found = links::links(url, &stripped);
        let text = clean::strip_entities(&clean::strip_tags(&stripped));

        let location = links::canonical(url);
        let mut local = InvertedIndex::new();
        local.add_words(&location, &self.stemmer.stems(&text));
        self.index.merge(local);
        tracing::debug!(%location, links = found.len(), "indexed page");

        let mut frontier = self.frontier.lock();
        for link in found {
            if frontier.len() >= self.limit {
                break;
            }
            if frontier.insert(link.to_string()) {
                Self::submit(&self, link);
            }
        }
    }
}
