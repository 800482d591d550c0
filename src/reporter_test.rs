//! Tests for reporters.

use crate::reporter::{JsonLinesReporter, MemoryReporter};
use crate::sink::Reporter;
use crate::types::{AccountContact, CapturedError, ContactType};

#[test]
fn json_lines_renders_contacts_and_errors_distinctly() {
  let mut reporter = JsonLinesReporter::new(Vec::new());
  reporter
    .success(&AccountContact::new("1", ContactType::Root, "root@example.com"))
    .unwrap();
  reporter
    .failure(&CapturedError::new(
      "1",
      Some(ContactType::Operations),
      "TooManyRequestsException: Rate exceeded",
    ))
    .unwrap();

  let out = String::from_utf8(reporter.into_inner()).unwrap();
  let lines: Vec<serde_json::Value> = out
    .lines()
    .map(|l| serde_json::from_str(l).unwrap())
    .collect();
  assert_eq!(lines.len(), 2);
  assert_eq!(
    lines[0],
    serde_json::json!({"account_id": "1", "contact_type": "ROOT", "email_address": "root@example.com"})
  );
  assert_eq!(
    lines[1],
    serde_json::json!({
      "account_id": "1",
      "contact_type": "OPERATIONS",
      "error": "TooManyRequestsException: Rate exceeded"
    })
  );
}

#[test]
fn memory_reporter_clones_share_results() {
  let reporter = MemoryReporter::<u8, String>::new();
  let mut handle = reporter.clone();
  handle.success(&1).unwrap();
  handle.failure(&"x".to_string()).unwrap();
  assert_eq!(reporter.successes(), vec![1]);
  assert_eq!(reporter.failures(), vec!["x".to_string()]);
}
