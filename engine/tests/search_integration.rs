use engine::builder::IndexBuilder;
use engine::query::{QueryEngine, SerialQueryEngine, ThreadedQueryEngine};
use engine::{ConcurrentInvertedIndex, InvertedIndex, WorkQueue};
use std::fs;
use std::io::Write;
use std::sync::Arc;

fn corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("animals.txt"), "cats chase mice\ncats sleep").unwrap();
    fs::write(dir.path().join("plants.txt"), "trees grow tall, mice hide in trees").unwrap();
    fs::write(dir.path().join("mixed.txt"), "cats climb trees").unwrap();
    dir
}

#[test]
fn build_then_query_end_to_end() {
    let dir = corpus();
    let mut index = InvertedIndex::new();
    IndexBuilder::new().build(dir.path(), &mut index);

    let mut engine = SerialQueryEngine::new(&index);
    engine.handle_query("cats", true);

    // "cats" stems to "cat"; animals.txt has it twice out of 5 tokens
    let results = engine.results("cats");
    assert_eq!(results.len(), 2);
    assert!(results[0].location.ends_with("animals.txt"));
    assert_eq!(results[0].count, 2);
    assert!((results[0].score - 2.0 / 5.0).abs() < 1e-12);
    assert!(results[1].location.ends_with("mixed.txt"));
}

#[test]
fn partial_queries_widen_the_match_set() {
    let dir = corpus();
    let mut index = InvertedIndex::new();
    IndexBuilder::new().build(dir.path(), &mut index);

    let mut engine = SerialQueryEngine::new(&index);
    // "tre" is a prefix of the stem "tree" but not an index word itself
    engine.handle_query("tre", true);
    engine.handle_query("tre", false);

    let map = engine.result_map();
    // exact and partial share the canonical key; exact ran first and won
    assert_eq!(map.len(), 1);
    assert!(map["tre"].is_empty());

    let mut partial = SerialQueryEngine::new(&index);
    partial.handle_query("tre", false);
    let results = partial.results("tre");
    assert_eq!(results.len(), 2);
}

#[test]
fn parallel_build_and_threaded_queries_agree_with_serial() {
    let dir = corpus();

    let mut plain = InvertedIndex::new();
    IndexBuilder::new().build(dir.path(), &mut plain);
    let mut serial = SerialQueryEngine::new(&plain);

    let shared = Arc::new(ConcurrentInvertedIndex::new());
    let queue = Arc::new(WorkQueue::new(4));
    IndexBuilder::new().build_parallel(dir.path(), &shared, &queue);
    let mut threaded = ThreadedQueryEngine::new(Arc::clone(&shared), Arc::clone(&queue));

    let mut queries = tempfile::NamedTempFile::new().unwrap();
    writeln!(queries, "cats").unwrap();
    writeln!(queries, "mice trees").unwrap();
    writeln!(queries, "absent").unwrap();
    writeln!(queries, "CATS").unwrap();

    serial.handle_queries(queries.path(), false).unwrap();
    threaded.handle_queries(queries.path(), false).unwrap();

    let expected = serial.result_map();
    let got = threaded.result_map();
    assert_eq!(expected.len(), got.len());
    for (key, expected_results) in expected {
        let got_results = &got[&key];
        assert_eq!(expected_results.len(), got_results.len(), "query {key}");
        for (e, g) in expected_results.iter().zip(got_results) {
            assert_eq!(e.location, g.location);
            assert_eq!(e.count, g.count);
            assert!((e.score - g.score).abs() < 1e-12);
        }
    }
}

#[test]
fn non_file_entries_do_not_abort_the_build() {
    let dir = corpus();
    fs::create_dir(dir.path().join("trap.txt")).unwrap();

    let mut index = InvertedIndex::new();
    IndexBuilder::new().build(dir.path(), &mut index);
    assert!(index.contains_word("cat"));
    assert_eq!(index.counts().len(), 3);
}
