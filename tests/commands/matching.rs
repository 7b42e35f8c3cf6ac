//! Integration tests for `wordmatch match`.

use crate::common::{parse_json, run_wordmatch_ok, stdout, TestDatabase};

#[test]
fn test_match_json_reports_both_searches() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple", "banana", "zebra"]);
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(dir.path(), &["-d", db.url(), "--json", "match", "mango"]);
    let json = parse_json(&output);
    assert_eq!(json["candidates"], 3);
    assert_eq!(json["value_strategy"], "value-diff");
    assert_eq!(json["lexical_strategy"], "lower-bound");
    assert_eq!(json["result"]["value"], "apple");
    // Only "apple" and "banana" sort before "mango"; "banana" is the tighter bound.
    assert_eq!(json["result"]["lexical"], "banana");
}

#[test]
fn test_match_does_not_store_text() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple"]);
    let dir = tempfile::tempdir().unwrap();

    run_wordmatch_ok(dir.path(), &["-d", db.url(), "match", "mango"]);

    assert_eq!(db.phrase_count("mango"), 0);
}

#[test]
fn test_match_empty_table_gives_nulls() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&[]);
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(dir.path(), &["-d", db.url(), "--json", "match", "hello"]);
    let json = parse_json(&output);
    assert!(json["result"]["value"].is_null());
    assert!(json["result"]["lexical"].is_null());
}

#[test]
fn test_match_alternate_strategies() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["ab", "a", "ba"]);
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(
        dir.path(),
        &[
            "-d",
            db.url(),
            "--json",
            "match",
            "xx",
            "--value-strategy",
            "length-diff",
            "--lexical-strategy",
            "case-insensitive",
        ],
    );
    let json = parse_json(&output);
    assert_eq!(json["result"]["value"], "ba");
    assert_eq!(json["result"]["lexical"], "ba");
}

#[test]
fn test_match_compare_lists_every_strategy_pair() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple", "banana", "zebra"]);
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(
        dir.path(),
        &["-d", db.url(), "--json", "match", "mango", "--compare"],
    );
    let json = parse_json(&output);
    let results = json.as_array().expect("compare output is an array");
    let pairs: Vec<(String, String)> = results
        .iter()
        .map(|r| {
            (
                r["value_strategy"].as_str().unwrap().to_string(),
                r["lexical_strategy"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("value-diff".to_string(), "lower-bound".to_string()),
            ("value-diff".to_string(), "case-insensitive".to_string()),
            ("length-diff".to_string(), "lower-bound".to_string()),
            ("length-diff".to_string(), "case-insensitive".to_string()),
        ]
    );

    let human = run_wordmatch_ok(dir.path(), &["-d", db.url(), "match", "mango", "--compare"]);
    let text = stdout(&human);
    assert!(text.contains("value-diff/lower-bound"));
    assert!(text.contains("length-diff/case-insensitive"));
}
