use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// word -> location -> ordered set of 1-based positions
type Postings = BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>;

/// Positional inverted index over a corpus of locations (file paths or page
/// URLs). Alongside the postings it tracks how many tokens were indexed per
/// location, which is the denominator for relevance scores. Not internally
/// synchronized; see [`crate::concurrent::ConcurrentInvertedIndex`].
#[derive(Debug, Default)]
pub struct InvertedIndex {
    index: Postings,
    counts: BTreeMap<String, usize>,
}

/// One ranked hit: where the matches were found, how many query-word
/// occurrences matched, and the score `count / word_count(where)`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(rename = "where")]
    pub location: String,
    pub count: usize,
    #[serde(serialize_with = "crate::json::eight_places")]
    pub score: f64,
}

impl SearchResult {
    /// Ranking order: score descending, then count descending, then
    /// location ascending ignoring case.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| {
                self.location
                    .to_lowercase()
                    .cmp(&other.location.to_lowercase())
            })
    }
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one occurrence of a word at a 1-based position within a
    /// location. Returns whether the index changed; duplicate positions are
    /// collapsed and do not affect the location's word count.
    pub fn add(&mut self, word: &str, location: &str, position: usize) -> bool {
        let inserted = self
            .index
            .entry(word.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);
        if inserted {
            *self.counts.entry(location.to_string()).or_insert(0) += 1;
        }
        inserted
    }

    /// Indexes an ordered list of stems under one location, assigning
    /// positions 1..=stems.len().
    pub fn add_words(&mut self, location: &str, stems: &[String]) {
        for (offset, stem) in stems.iter().enumerate() {
            self.add(stem, location, offset + 1);
        }
    }

    /// Folds another index into this one. Word counts grow by the number of
    /// positions actually inserted, so merging overlapping content never
    /// double-counts.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (word, locations) in other.index {
            let merged = self.index.entry(word).or_default();
            for (location, positions) in locations {
                let set = merged.entry(location.clone()).or_default();
                let mut added = 0;
                for position in positions {
                    if set.insert(position) {
                        added += 1;
                    }
                }
                if added > 0 {
                    *self.counts.entry(location).or_insert(0) += added;
                }
            }
        }
    }

    /// Exact search: each query word must be a literal index key. Results
    /// for the same location accumulate across query words.
    pub fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matches: BTreeMap<&String, usize> = BTreeMap::new();
        for query in queries {
            if let Some(locations) = self.index.get(query) {
                for (location, positions) in locations {
                    *matches.entry(location).or_insert(0) += positions.len();
                }
            }
        }
        self.rank(matches)
    }

    /// Partial search: every index word with a query word as prefix matches.
    /// Always a superset of the exact results for the same queries.
    pub fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matches: BTreeMap<&String, usize> = BTreeMap::new();
        for query in queries {
            let from = (Bound::Included(query.as_str()), Bound::Unbounded);
            for (word, locations) in self.index.range::<str, _>(from) {
                if !word.starts_with(query.as_str()) {
                    break;
                }
                for (location, positions) in locations {
                    *matches.entry(location).or_insert(0) += positions.len();
                }
            }
        }
        self.rank(matches)
    }

    /// Dispatches to exact or partial search.
    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        if exact {
            self.exact_search(queries)
        } else {
            self.partial_search(queries)
        }
    }

    fn rank(&self, matches: BTreeMap<&String, usize>) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = matches
            .into_iter()
            .map(|(location, count)| {
                // a matched location always has at least one indexed token
                let total = self.counts.get(location).copied().unwrap_or(1);
                SearchResult {
                    location: location.clone(),
                    count,
                    score: count as f64 / total as f64,
                }
            })
            .collect();
        results.sort_by(SearchResult::rank_cmp);
        results
    }

    pub fn words(&self) -> Vec<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    pub fn locations(&self, word: &str) -> Vec<&str> {
        self.index
            .get(word)
            .map(|locations| locations.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The positions of a word within a location, empty if either is absent.
    pub fn positions(&self, word: &str, location: &str) -> BTreeSet<usize> {
        self.index
            .get(word)
            .and_then(|locations| locations.get(location))
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn contains_location(&self, word: &str, location: &str) -> bool {
        self.index
            .get(word)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn contains_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.index
            .get(word)
            .and_then(|locations| locations.get(location))
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Total tokens successfully indexed for a location, 0 if unknown.
    pub fn word_count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Per-location word counts, keyed by location.
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn num_words(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Serialize for InvertedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.index.serialize(serializer)
    }
}
