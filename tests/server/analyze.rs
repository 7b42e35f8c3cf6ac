//! Integration tests for the HTTP service backed by PostgreSQL.

use serde_json::json;
use std::time::{Duration, Instant};

use crate::common::{TestDatabase, TestServer};

#[test]
fn test_analyze_persists_text() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&[]);
    let server = TestServer::start(&["-d", db.url()]);

    let response = server.analyze(json!({"text": "hello"}));
    assert_eq!(response.status().as_u16(), 200);

    assert!(
        db.wait_for_phrase_count("hello", 1),
        "text was not persisted:\n{}",
        server.log()
    );
}

#[test]
fn test_analyze_twice_keeps_duplicates() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["hello"]);
    let server = TestServer::start(&["-d", db.url()]);

    for _ in 0..2 {
        let response = server.analyze(json!({"text": "hello"}));
        assert_eq!(response.status().as_u16(), 200);
    }

    assert!(db.wait_for_phrase_count("hello", 3));
}

#[test]
fn test_analyze_matches_stored_phrases() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["a", "z", "bb"]);
    let server = TestServer::start(&["-d", db.url()]);

    let response = server.analyze(json!({"text": "ab"}));
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"));

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["value"], "bb");
    // "a" is the only candidate sorting before "ab".
    assert_eq!(body["lexical"], "a");
}

#[test]
fn test_analyze_empty_table_returns_nulls() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&[]);
    let server = TestServer::start(&["-d", db.url()]);

    let body: serde_json::Value = server.analyze(json!({"text": "hello"})).json().unwrap();
    assert_eq!(body, json!({"value": null, "lexical": null}));
}

#[test]
fn test_analyze_missing_table_returns_500() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let server = TestServer::start(&["-d", db.url()]);

    let response = server.analyze(json!({"text": "hello"}));
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().unwrap(), "Internal Server Error");
}

#[test]
fn test_serve_init_creates_table() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let server = TestServer::start(&["-d", db.url(), "--init"]);

    let response = server.analyze(json!({"text": "hello"}));
    assert_eq!(response.status().as_u16(), 200);
    assert!(db.wait_for_phrase_count("hello", 1));
}

#[test]
fn test_analyze_recovers_after_sessions_are_terminated() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["apple"]);
    let server = TestServer::start(&["-d", db.url()]);

    assert_eq!(server.analyze(json!({"text": "before"})).status().as_u16(), 200);
    assert!(db.wait_for_phrase_count("before", 1));

    db.terminate_sessions();

    // Requests racing the dropped connections may fail; the service must come back.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut recovered = false;
    while Instant::now() < deadline {
        if server.analyze(json!({"text": "after"})).status().as_u16() == 200 {
            recovered = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(recovered, "service never recovered:\n{}", server.log());

    // The insert of that request may itself have hit a stale slot; keep going until one lands.
    let deadline = Instant::now() + Duration::from_secs(10);
    while db.phrase_count("after") == 0 && Instant::now() < deadline {
        server.analyze(json!({"text": "after"}));
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(db.phrase_count("after") >= 1, "{}", server.log());
    assert!(server.log().contains("reopening phrase store connection"));
}

#[test]
fn test_get_analyze_counts_phrases() {
    skip_if_no_db!();
    let db = TestDatabase::with_phrases(&["hello", "hello", "world"]);
    let server = TestServer::start(&["-d", db.url()]);

    assert_eq!(server.phrase_counts(), json!({"hello": 2, "world": 1}));
}

#[test]
fn test_peer_mode_uses_peer_phrases() {
    skip_if_no_db!();
    let peer_db = TestDatabase::with_phrases(&["apple", "banana"]);
    let peer = TestServer::start(&["-d", peer_db.url()]);

    let local_db = TestDatabase::with_phrases(&["zebra"]);
    let peer_url = peer.url("");
    let server = TestServer::start(&["-d", local_db.url(), "--peer", &peer_url]);

    let body: serde_json::Value = server.analyze(json!({"text": "mango"})).json().unwrap();
    assert_eq!(body, json!({"value": "apple", "lexical": "banana"}));

    assert!(local_db.wait_for_phrase_count("mango", 1));
    assert_eq!(peer_db.phrase_count("mango"), 0);
}
