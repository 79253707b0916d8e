use crate::concurrent::ConcurrentInvertedIndex;
use crate::index::InvertedIndex;
use crate::queue::WorkQueue;
use crate::text::WordStemmer;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Finds the plain-text files under root, sorted so builds are
/// deterministic. A root that is itself a file is returned as-is.
pub fn list_text_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("text"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Turns a corpus of text files into index entries, sequentially or across
/// a work queue. Each parallel task builds a private index for one file and
/// merges it into the shared index in a single write-lock acquisition.
pub struct IndexBuilder {
    stemmer: Arc<WordStemmer>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::with_stemmer(WordStemmer::default())
    }

    pub fn with_stemmer(stemmer: WordStemmer) -> Self {
        Self {
            stemmer: Arc::new(stemmer),
        }
    }

    /// Indexes every text file under root. A file that cannot be read is
    /// logged and skipped; the build continues.
    pub fn build(&self, root: &Path, index: &mut InvertedIndex) {
        for path in list_text_files(root) {
            if let Err(err) = index_file(index, &self.stemmer, &path) {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable file");
            }
        }
    }

    /// Indexes every text file under root in parallel, one task per file.
    /// Blocks on the queue's finish barrier before returning.
    pub fn build_parallel(
        &self,
        root: &Path,
        index: &Arc<ConcurrentInvertedIndex>,
        queue: &WorkQueue,
    ) {
        for path in list_text_files(root) {
            let index = Arc::clone(index);
            let stemmer = Arc::clone(&self.stemmer);
            queue.execute(move || {
                let mut local = InvertedIndex::new();
                match index_file(&mut local, &stemmer, &path) {
                    Ok(()) => index.merge(local),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), %err, "skipping unreadable file")
                    }
                }
            });
        }
        queue.finish();
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stems one whole file and indexes it under its path, positions running
/// across line boundaries.
fn index_file(index: &mut InvertedIndex, stemmer: &WordStemmer, path: &Path) -> Result<()> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    index.add_words(&path.to_string_lossy(), &stemmer.stems(&text));
    Ok(())
}
