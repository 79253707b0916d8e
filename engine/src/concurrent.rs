use crate::index::{InvertedIndex, SearchResult};
use crate::lock::{ReadGuard, ReadWriteLock};
use std::collections::{BTreeMap, BTreeSet};

/// Thread-safe decorator over [`InvertedIndex`]: mutating operations take
/// the write lock, queries and accessors take the read lock, so parallel
/// builds and concurrent searches interleave safely. Workers fold whole
/// per-document indexes in through [`merge`](Self::merge) under a single
/// write acquisition instead of locking per posting.
#[derive(Default)]
pub struct ConcurrentInvertedIndex {
    index: ReadWriteLock<InvertedIndex>,
}

impl ConcurrentInvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, word: &str, location: &str, position: usize) -> bool {
        self.index.write().add(word, location, position)
    }

    pub fn add_words(&self, location: &str, stems: &[String]) {
        self.index.write().add_words(location, stems)
    }

    /// Merges a whole private index under one write-lock acquisition.
    pub fn merge(&self, other: InvertedIndex) {
        self.index.write().merge(other)
    }

    pub fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.index.read().exact_search(queries)
    }

    pub fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.index.read().partial_search(queries)
    }

    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        self.index.read().search(queries, exact)
    }

    pub fn words(&self) -> Vec<String> {
        self.index
            .read()
            .words()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn locations(&self, word: &str) -> Vec<String> {
        self.index
            .read()
            .locations(word)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn positions(&self, word: &str, location: &str) -> BTreeSet<usize> {
        self.index.read().positions(word, location)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.index.read().contains_word(word)
    }

    pub fn contains_location(&self, word: &str, location: &str) -> bool {
        self.index.read().contains_location(word, location)
    }

    pub fn contains_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.index.read().contains_position(word, location, position)
    }

    pub fn word_count(&self, location: &str) -> usize {
        self.index.read().word_count(location)
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.index.read().counts().clone()
    }

    pub fn num_words(&self) -> usize {
        self.index.read().num_words()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Read-locked view of the underlying index, for serialization. The
    /// lock is held for the lifetime of the guard.
    pub fn read(&self) -> ReadGuard<'_, InvertedIndex> {
        self.index.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_adds_of_disjoint_words_lose_nothing() {
        let index = Arc::new(ConcurrentInvertedIndex::new());
        let threads = 8;
        let words_per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for w in 0..words_per_thread {
                        index.add(&format!("word-{t}-{w}"), &format!("doc-{t}"), w + 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.num_words(), threads * words_per_thread);
        for t in 0..threads {
            assert_eq!(index.word_count(&format!("doc-{t}")), words_per_thread);
        }
    }

    #[test]
    fn concurrent_merges_accumulate() {
        let index = Arc::new(ConcurrentInvertedIndex::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let mut local = InvertedIndex::new();
                    local.add_words(
                        &format!("doc-{t}"),
                        &["alpha".into(), "beta".into(), "gamma".into()],
                    );
                    index.merge(local);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.num_words(), 3);
        assert_eq!(index.locations("alpha").len(), 4);
    }

    #[test]
    fn searches_run_against_merged_state() {
        let index = ConcurrentInvertedIndex::new();
        index.add_words("page", &["find".into(), "me".into()]);
        let queries: BTreeSet<String> = ["find".to_string()].into_iter().collect();
        let results = index.exact_search(&queries);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "page");
    }
}
