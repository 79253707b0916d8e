use crate::index::{InvertedIndex, SearchResult};
use anyhow::Result;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes a relevance score rounded to eight decimal places, the
/// precision the result files carry.
pub fn eight_places<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((score * 1e8).round() / 1e8)
}

/// Writes the index as pretty JSON: word -> location -> positions.
pub fn write_index(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_pretty(index, path)
}

/// Writes per-location word counts as pretty JSON.
pub fn write_counts(counts: &BTreeMap<String, usize>, path: &Path) -> Result<()> {
    write_pretty(counts, path)
}

/// Writes ranked results keyed by canonical query as pretty JSON.
pub fn write_results(results: &BTreeMap<String, Vec<SearchResult>>, path: &Path) -> Result<()> {
    write_pretty(results, path)
}

fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}
