//! Integration tests for loading documents from disk.

use flate2::write::GzEncoder;
use flate2::Compression;
use jsonhand::document::Node;
use jsonhand::file::loader::{is_json, load_file};
use jsonhand::jsonpath::{find, FindOptions, Match};
use std::fs;
use std::io::Write;
use std::path::Path;

fn write_gzip(path: &Path, content: &str) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn query(tree: &Node, expr: &str) -> Vec<Node> {
    find(tree, expr, &FindOptions::default())
        .unwrap_or_default()
        .into_iter()
        .map(Match::into_node)
        .collect()
}

#[test]
fn test_load_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.json");
    fs::write(&path, r#"{"data": [{"year": 2016}, {"year": 2017}]}"#).unwrap();

    let tree = load_file(&path).unwrap();
    assert_eq!(
        query(&tree, "$.data[*].year"),
        vec![Node::from(2016_i64), Node::from(2017_i64)]
    );
}

#[test]
fn test_load_keeps_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ordered.json");
    fs::write(&path, r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();

    let tree = load_file(&path).unwrap();
    assert_eq!(
        query(&tree, "$.!"),
        vec![Node::from("z"), Node::from("a"), Node::from("m")]
    );
}

#[test]
fn test_load_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.yml");
    fs::write(
        &path,
        "store:\n  book:\n    - title: Moby Dick\n      price: 8.99\n    - title: Dune\n      price: 12\n",
    )
    .unwrap();

    let tree = load_file(&path).unwrap();
    assert_eq!(
        query(&tree, "$.store.book[?(@.price < 10)].title"),
        vec![Node::from("Moby Dick")]
    );
}

#[test]
fn test_load_gzipped_json_and_yaml() {
    let dir = tempfile::tempdir().unwrap();

    let json_path = dir.path().join("doc.json.gz");
    write_gzip(&json_path, r#"{"a": {"b": [1, 2, 3]}}"#);
    let tree = load_file(&json_path).unwrap();
    assert_eq!(query(&tree, "$.a.b[-1:]"), vec![Node::from(3_i64)]);

    let yaml_path = dir.path().join("doc.yaml.gz");
    write_gzip(&yaml_path, "a:\n  b: [1, 2, 3]\n");
    let tree = load_file(&yaml_path).unwrap();
    assert_eq!(query(&tree, "$.a.b[0]"), vec![Node::from(1_i64)]);
}

#[test]
fn test_load_jsonl_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    fs::write(&path, "{\"id\": 1}\n{\"id\": 2}\n\n{\"id\": 3}\n").unwrap();

    let tree = load_file(&path).unwrap();
    assert_eq!(tree.len(), Some(3));
    assert_eq!(query(&tree, "$[?(@.id > 1)].id").len(), 2);
}

#[test]
fn test_blank_file_matches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.json");
    fs::write(&path, "\n").unwrap();

    let tree = load_file(&path).unwrap();
    assert!(find(&tree, "$", &FindOptions::default()).is_none());
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_file(dir.path().join("missing.json")).is_err());

    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"a\": ").unwrap();
    assert!(load_file(&path).is_err());
}

#[test]
fn test_is_json() {
    assert!(is_json(r#"{"key1": "value"}"#));
    assert!(is_json("[]"));
    assert!(!is_json("1235678abc"));
    assert!(!is_json("key: value"));
}
