//! Integration tests for atomic writes combined with resilient reads.

use rollover_jsonl::{read_json_document, read_jsonl_resilient, write_json_atomic, write_jsonl_atomic, Warning};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Entry {
    id: String,
    hours: f64,
}

fn entry(id: &str, hours: f64) -> Entry {
    Entry {
        id: id.to_string(),
        hours,
    }
}

#[tokio::test]
async fn written_log_reads_back_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    let entries = vec![entry("c", 3.0), entry("a", 1.5), entry("b", 0.0)];

    write_jsonl_atomic(&path, entries.iter()).await.unwrap();
    let (loaded, warnings) = read_jsonl_resilient::<Entry, _>(&path).await.unwrap();

    assert!(warnings.is_empty());
    assert_eq!(loaded, entries);
}

#[tokio::test]
async fn hand_edited_log_keeps_good_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    write_jsonl_atomic(&path, [entry("a", 1.0)].iter())
        .await
        .unwrap();

    let mut content = tokio::fs::read_to_string(&path).await.unwrap();
    content.push_str("{\"id\": \"truncated\n");
    content.push_str("[1, 2, 3]\n");
    content.push_str("{\"id\":\"b\",\"hours\":2.0}\n");
    tokio::fs::write(&path, content).await.unwrap();

    let (loaded, warnings) = read_jsonl_resilient::<Entry, _>(&path).await.unwrap();

    assert_eq!(loaded, vec![entry("a", 1.0), entry("b", 2.0)]);
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0], Warning::MalformedJson { line_number: 2, .. }));
    assert!(matches!(warnings[1], Warning::WrongShape { line_number: 3, .. }));
}

#[tokio::test]
async fn missing_log_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = read_jsonl_resilient::<Entry, _>(dir.path().join("absent.jsonl")).await;
    assert!(matches!(result, Err(rollover_jsonl::Error::Io(_))));
}

#[tokio::test]
async fn document_overwrite_is_complete() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cycle.json");

    write_json_atomic(&path, &entry("first", 10.0)).await.unwrap();
    write_json_atomic(&path, &entry("second", 2.5)).await.unwrap();

    let loaded: Option<Entry> = read_json_document(&path).await.unwrap();
    assert_eq!(loaded, Some(entry("second", 2.5)));
}
