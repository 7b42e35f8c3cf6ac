//! Integration tests for `wordmatch init` and `wordmatch phrases`.

use crate::common::{parse_json, run_wordmatch, run_wordmatch_ok, stdout, TestDatabase};

#[test]
fn test_init_creates_phrases_table() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let dir = tempfile::tempdir().unwrap();

    run_wordmatch_ok(dir.path(), &["-d", db.url(), "init"]);

    let exists = db.query("SELECT to_regclass('public.phrases') IS NOT NULL");
    assert_eq!(exists, "t");
}

#[test]
fn test_init_is_idempotent() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["kept"]);
    let dir = tempfile::tempdir().unwrap();

    run_wordmatch_ok(dir.path(), &["-d", db.url(), "init"]);
    run_wordmatch_ok(dir.path(), &["-d", db.url(), "init"]);

    assert_eq!(db.phrase_count("kept"), 1);
}

#[test]
fn test_phrases_add_then_list() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&[]);
    let dir = tempfile::tempdir().unwrap();

    run_wordmatch_ok(dir.path(), &["-d", db.url(), "phrases", "add", "hello"]);
    run_wordmatch_ok(dir.path(), &["-d", db.url(), "phrases", "add", "hello"]);

    let output = run_wordmatch_ok(dir.path(), &["-d", db.url(), "phrases", "list"]);
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(lines, vec!["hello".to_string(), "hello".to_string()]);
}

#[test]
fn test_phrases_list_json() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple", "banana"]);
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(dir.path(), &["-d", db.url(), "--json", "phrases", "list"]);
    let json = parse_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["count"], 2);
    let phrases = json["phrases"].as_array().unwrap();
    assert!(phrases.iter().any(|p| p == "apple"));
    assert!(phrases.iter().any(|p| p == "banana"));
}

#[test]
fn test_phrases_list_skips_null_rows() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple"]);
    db.run_sql_ok("INSERT INTO phrases (phrase) VALUES (NULL)");
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch_ok(dir.path(), &["-d", db.url(), "--json", "phrases", "list"]);
    assert_eq!(parse_json(&output)["count"], 1);
}

#[test]
fn test_phrases_list_without_table_fails() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let dir = tempfile::tempdir().unwrap();

    let output = run_wordmatch(dir.path(), &["-d", db.url(), "phrases", "list"]);
    assert_eq!(output.status.code(), Some(10));
}
