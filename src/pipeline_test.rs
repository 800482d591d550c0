//! Tests for `Pipeline`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::api::ApiError;
use crate::contacts::{AccountLister, ContactResolver};
use crate::error::PipelineError;
use crate::fixture::ListingFault;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::producer::PayloadSource;
use crate::reporter::MemoryReporter;
use crate::test_utils::{account_id, memory_org, mixed_outcome_organization, unthrottled};
use crate::types::{AccountContact, CapturedError, ContactType};
use crate::worker::{PayloadHandler, SubOutcome};

struct Numbers(u32);

impl PayloadSource for Numbers {
  type Payload = u32;
  type Error = ApiError;

  fn payloads(&self) -> BoxStream<'_, Result<u32, ApiError>> {
    stream::iter((0..self.0).map(Ok)).boxed()
  }
}

/// Payload 0 fails every sub-operation; others succeed three times.
struct PoisonZero {
  handled: AtomicUsize,
}

#[async_trait]
impl PayloadHandler for PoisonZero {
  type Payload = u32;
  type Output = u32;
  type Error = String;

  async fn handle(&self, payload: &u32) -> Vec<SubOutcome<u32, String>> {
    self.handled.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(u64::from(payload % 3))).await;
    (0..3)
      .map(|_| {
        if *payload == 0 {
          SubOutcome::Failure(format!("payload {payload} failed"))
        } else {
          SubOutcome::Success(*payload)
        }
      })
      .collect()
  }
}

fn poison_zero() -> Arc<PoisonZero> {
  Arc::new(PoisonZero {
    handled: AtomicUsize::new(0),
  })
}

#[test]
fn rejects_zero_workers() {
  let err = Pipeline::new(PipelineConfig::with_workers(0)).unwrap_err();
  assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn rejects_zero_capacity() {
  let err = Pipeline::new(PipelineConfig::with_workers(2).bounded(0)).unwrap_err();
  assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn default_config_has_four_unbounded_workers() {
  let config = PipelineConfig::default();
  assert_eq!(config.worker_count, 4);
  assert!(config.input_capacity.is_none());
  assert!(config.output_capacity.is_none());
}

#[tokio::test]
async fn sink_sees_one_sentinel_per_worker() {
  for workers in [1, 3, 8] {
    let pipeline = Pipeline::new(PipelineConfig::with_workers(workers)).unwrap();
    let handler = poison_zero();
    let summary = pipeline
      .run(Numbers(10), Arc::clone(&handler), MemoryReporter::new())
      .await
      .unwrap();
    assert_eq!(summary.sink.sentinels, workers);
    assert_eq!(summary.workers.len(), workers);
    assert_eq!(summary.payloads, 10);
    assert_eq!(handler.handled.load(Ordering::SeqCst), 10);
    let ids: Vec<usize> = summary.workers.iter().map(|w| w.worker_id).collect();
    assert_eq!(ids, (0..workers).collect::<Vec<_>>());
  }
}

#[tokio::test]
async fn failing_payload_does_not_hide_other_results() {
  let pipeline = Pipeline::new(PipelineConfig::with_workers(2)).unwrap();
  let reporter = MemoryReporter::new();
  let summary = pipeline
    .run(Numbers(5), poison_zero(), reporter.clone())
    .await
    .unwrap();

  assert_eq!(summary.failures(), 3);
  assert_eq!(summary.successes(), 12);
  let mut seen = reporter.successes();
  seen.sort_unstable();
  seen.dedup();
  assert_eq!(seen, vec![1, 2, 3, 4]);
  assert!(reporter.failures().iter().all(|e| e == "payload 0 failed"));
}

#[tokio::test]
async fn bounded_queues_of_one_still_complete() {
  let pipeline = Pipeline::new(PipelineConfig::with_workers(3).bounded(1)).unwrap();
  let summary = pipeline
    .run(Numbers(25), poison_zero(), MemoryReporter::new())
    .await
    .unwrap();
  assert_eq!(summary.payloads, 25);
  assert_eq!(summary.successes() + summary.failures(), 75);
  let handled: usize = summary.workers.iter().map(|w| w.payloads).sum();
  assert_eq!(handled, 25);
}

#[tokio::test]
async fn empty_source_terminates() {
  let pipeline = Pipeline::new(PipelineConfig::with_workers(4)).unwrap();
  let summary = pipeline
    .run(Numbers(0), poison_zero(), MemoryReporter::new())
    .await
    .unwrap();
  assert_eq!(summary.payloads, 0);
  assert_eq!(summary.sink.sentinels, 4);
  assert!(summary.finished_at >= summary.started_at);
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
  let mut fixture = mixed_outcome_organization(6);
  fixture.listing_fault = Some(ListingFault {
    after_pages: 1,
    code: "ServiceException".to_string(),
    message: "listing unavailable".to_string(),
  });
  let org = memory_org(fixture);
  let pipeline = Pipeline::new(PipelineConfig::with_workers(2)).unwrap();
  let reporter = MemoryReporter::<AccountContact, CapturedError>::new();
  let err = pipeline
    .run(
      AccountLister::new(org.clone()),
      Arc::new(ContactResolver::new(org, unthrottled())),
      reporter,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, PipelineError::Source(_)));
  assert!(err.to_string().contains("listing unavailable"));
}

#[tokio::test]
async fn contact_results_add_up_per_account() {
  let org = memory_org(mixed_outcome_organization(5));
  let reporter = MemoryReporter::new();
  let pipeline = Pipeline::new(PipelineConfig::with_workers(3)).unwrap();
  let summary = pipeline
    .run(
      AccountLister::new(org.clone()),
      Arc::new(ContactResolver::new(org, unthrottled())),
      reporter.clone(),
    )
    .await
    .unwrap();

  assert_eq!(summary.payloads, 5);
  let mut per_account: BTreeMap<String, usize> = BTreeMap::new();
  for c in reporter.successes() {
    *per_account.entry(c.account_id).or_default() += 1;
  }
  for e in reporter.failures() {
    assert_eq!(e.contact_type, Some(ContactType::Operations));
    *per_account.entry(e.account_id).or_default() += 1;
  }
  // ROOT + BILLING + OPERATIONS error; SECURITY is absent.
  assert_eq!(per_account.len(), 5);
  assert!(per_account.values().all(|&n| n == 3));
  assert!(per_account.contains_key(&account_id(0)));
}
