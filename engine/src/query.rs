use crate::concurrent::ConcurrentInvertedIndex;
use crate::index::{InvertedIndex, SearchResult};
use crate::queue::WorkQueue;
use crate::text::WordStemmer;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

fn canonical_key(stems: &BTreeSet<String>) -> String {
    stems
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses query lines, runs exact or partial searches, and accumulates the
/// ranked results keyed by the canonical form of each query (its unique
/// stems joined by spaces). Repeated queries with the same canonical form
/// are answered once.
pub trait QueryEngine {
    /// Runs one line of query words. A line whose stems are empty is
    /// ignored.
    fn handle_query(&mut self, line: &str, exact: bool);

    /// The ranked results stored for a query, empty if it never matched
    /// anything or was never issued.
    fn results(&self, query: &str) -> Vec<SearchResult>;

    /// Every accumulated result list, keyed by canonical query.
    fn result_map(&self) -> BTreeMap<String, Vec<SearchResult>>;

    /// Streams a query file through [`handle_query`](Self::handle_query),
    /// one line per query.
    fn handle_queries(&mut self, path: &Path, exact: bool) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            self.handle_query(&line?, exact);
        }
        Ok(())
    }
}

/// Single-threaded query engine borrowing a plain index.
pub struct SerialQueryEngine<'a> {
    index: &'a InvertedIndex,
    stemmer: WordStemmer,
    results: BTreeMap<String, Vec<SearchResult>>,
}

impl<'a> SerialQueryEngine<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self::with_stemmer(index, WordStemmer::default())
    }

    pub fn with_stemmer(index: &'a InvertedIndex, stemmer: WordStemmer) -> Self {
        Self {
            index,
            stemmer,
            results: BTreeMap::new(),
        }
    }
}

impl QueryEngine for SerialQueryEngine<'_> {
    fn handle_query(&mut self, line: &str, exact: bool) {
        let stems = self.stemmer.unique_stems(line);
        if stems.is_empty() {
            return;
        }
        let key = canonical_key(&stems);
        if self.results.contains_key(&key) {
            return;
        }
        let ranked = self.index.search(&stems, exact);
        self.results.insert(key, ranked);
    }

    fn results(&self, query: &str) -> Vec<SearchResult> {
        let key = canonical_key(&self.stemmer.unique_stems(query));
        self.results.get(&key).cloned().unwrap_or_default()
    }

    fn result_map(&self) -> BTreeMap<String, Vec<SearchResult>> {
        self.results.clone()
    }
}

/// Pool-backed query engine: every line becomes an independent task against
/// the shared concurrent index. Results are complete once the queue's
/// finish barrier has passed; `handle_queries` takes care of that.
pub struct ThreadedQueryEngine {
    index: Arc<ConcurrentInvertedIndex>,
    queue: Arc<WorkQueue>,
    stemmer: Arc<WordStemmer>,
    results: Arc<Mutex<BTreeMap<String, Vec<SearchResult>>>>,
}

impl ThreadedQueryEngine {
    pub fn new(index: Arc<ConcurrentInvertedIndex>, queue: Arc<WorkQueue>) -> Self {
        Self {
            index,
            queue,
            stemmer: Arc::new(WordStemmer::default()),
            results: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Blocks until every outstanding query task has completed.
    pub fn finish(&self) {
        self.queue.finish();
    }
}

impl QueryEngine for ThreadedQueryEngine {
    fn handle_query(&mut self, line: &str, exact: bool) {
        let line = line.to_string();
        let index = Arc::clone(&self.index);
        let stemmer = Arc::clone(&self.stemmer);
        let results = Arc::clone(&self.results);
        self.queue.execute(move || {
            let stems = stemmer.unique_stems(&line);
            if stems.is_empty() {
                return;
            }
            let key = canonical_key(&stems);
            {
                // reserve the key so no concurrent task repeats this search
                let mut map = results.lock();
                match map.entry(key.clone()) {
                    Entry::Occupied(_) => return,
                    Entry::Vacant(slot) => {
                        slot.insert(Vec::new());
                    }
                }
            }
            let ranked = index.search(&stems, exact);
            results.lock().insert(key, ranked);
        });
    }

    fn results(&self, query: &str) -> Vec<SearchResult> {
        let key = canonical_key(&self.stemmer.unique_stems(query));
        self.results.lock().get(&key).cloned().unwrap_or_default()
    }

    fn result_map(&self) -> BTreeMap<String, Vec<SearchResult>> {
        self.results.lock().clone()
    }

    fn handle_queries(&mut self, path: &Path, exact: bool) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            self.handle_query(&line?, exact);
        }
        self.queue.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.add_words(
            "a.txt",
            &["apple".into(), "banana".into(), "apple".into()],
        );
        index.add_words("b.txt", &["banana".into(), "cherry".into()]);
        index
    }

    #[test]
    fn repeated_queries_are_answered_once() {
        let index = sample_index();
        let mut engine = SerialQueryEngine::new(&index);
        engine.handle_query("apple", true);
        engine.handle_query("APPLE!", true);
        assert_eq!(engine.result_map().len(), 1);
    }

    #[test]
    fn word_order_does_not_change_the_canonical_query() {
        let index = sample_index();
        let mut engine = SerialQueryEngine::new(&index);
        engine.handle_query("banana apple", true);
        engine.handle_query("apple banana", true);
        let map = engine.result_map();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("appl banana"));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let index = sample_index();
        let mut engine = SerialQueryEngine::new(&index);
        engine.handle_query("   ", false);
        engine.handle_query("...", false);
        assert!(engine.result_map().is_empty());
    }

    #[test]
    fn results_come_back_ranked() {
        let index = sample_index();
        let mut engine = SerialQueryEngine::new(&index);
        engine.handle_query("apple", true);
        let results = engine.results("apple");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "a.txt");
        assert_eq!(results[0].count, 2);
    }

    #[test]
    fn unknown_query_yields_empty_results() {
        let index = sample_index();
        let engine = SerialQueryEngine::new(&index);
        assert!(engine.results("never asked").is_empty());
    }

    #[test]
    fn threaded_engine_matches_serial_results() {
        let shared = Arc::new(ConcurrentInvertedIndex::new());
        shared.add_words(
            "a.txt",
            &["apple".into(), "banana".into(), "apple".into()],
        );
        shared.add_words("b.txt", &["banana".into(), "cherry".into()]);

        let queue = Arc::new(WorkQueue::new(4));
        let mut threaded = ThreadedQueryEngine::new(Arc::clone(&shared), queue);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apple").unwrap();
        writeln!(file, "banana cherry").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "apple").unwrap();
        threaded.handle_queries(file.path(), true).unwrap();

        let index = sample_index();
        let mut serial = SerialQueryEngine::new(&index);
        serial.handle_queries(file.path(), true).unwrap();

        let threaded_map = threaded.result_map();
        let serial_map = serial.result_map();
        assert_eq!(threaded_map.len(), serial_map.len());
        for (key, expected) in serial_map {
            let got = &threaded_map[&key];
            assert_eq!(got.len(), expected.len());
            for (g, e) in got.iter().zip(&expected) {
                assert_eq!(g.location, e.location);
                assert_eq!(g.count, e.count);
            }
        }
    }
}
