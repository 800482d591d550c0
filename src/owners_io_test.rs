//! Tests for owner map parsing.

use std::io::Cursor;

use crate::owners_io::{OwnerMap, OwnerMapError, load_owner_map, parse_owner_map};

#[test]
fn parses_records_in_file_order() {
  let input = r#"{"account_id": "222", "workload_owner": "b@example.com"}
{"account_id": "111", "workload_owner": "a@example.com"}
"#;
  let map = parse_owner_map(Cursor::new(input)).unwrap();
  let entries: Vec<(&str, &str)> = map.iter().collect();
  assert_eq!(
    entries,
    vec![("222", "b@example.com"), ("111", "a@example.com")]
  );
}

#[test]
fn skips_blank_lines_and_keeps_last_duplicate() {
  let input = "{\"account_id\":\"1\",\"workload_owner\":\"old@example.com\"}\n\n   \n{\"account_id\":\"1\",\"workload_owner\":\"new@example.com\"}\n";
  let map = parse_owner_map(Cursor::new(input)).unwrap();
  assert_eq!(map.len(), 1);
  assert_eq!(map.get("1"), Some("new@example.com"));
}

#[test]
fn reports_line_number_of_bad_record() {
  let input = "{\"account_id\":\"1\",\"workload_owner\":\"a@example.com\"}\n{\"account_id\":\"2\"}\n";
  match parse_owner_map(Cursor::new(input)) {
    Err(OwnerMapError::Parse { line, .. }) => assert_eq!(line, 2),
    other => panic!("expected parse error, got {other:?}"),
  }
}

#[test]
fn load_missing_file_names_path() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("owners.jsonl");
  let err = load_owner_map(&path).unwrap_err();
  assert!(matches!(err, OwnerMapError::Io { .. }));
  assert!(err.to_string().contains("owners.jsonl"));
}

#[test]
fn load_reads_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("owners.jsonl");
  std::fs::write(&path, "{\"account_id\":\"9\",\"workload_owner\":\"x@example.com\"}\n").unwrap();
  let map = load_owner_map(&path).unwrap();
  assert_eq!(map, OwnerMap::from_iter([("9", "x@example.com")]));
}
