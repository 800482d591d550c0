//! Fan-out worker: takes one payload at a time from the input queue, runs the
//! handler's sub-operations, and pushes every outcome to the output queue.
//!
//! Sub-operation failures are values ([SubOutcome::Failure]) and go to the
//! output queue like successes; they never stop the worker.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::error::QueueError;
use crate::queue::{StageItem, StageQueue};

/// Outcome of a single sub-operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubOutcome<O, E> {
  Success(O),
  /// Nothing to report for this sub-operation.
  Absent,
  Failure(E),
}

impl<O, E> From<Result<Option<O>, E>> for SubOutcome<O, E> {
  fn from(result: Result<Option<O>, E>) -> Self {
    match result {
      Ok(Some(value)) => SubOutcome::Success(value),
      Ok(None) => SubOutcome::Absent,
      Err(e) => SubOutcome::Failure(e),
    }
  }
}

/// Per-payload work run by a fan-out worker.
#[async_trait]
pub trait PayloadHandler: Send + Sync + 'static {
  type Payload: Send + Sync + 'static;
  type Output: Send + 'static;
  type Error: Send + 'static;

  /// Runs every sub-operation for `payload` and returns one outcome per
  /// sub-operation. Sub-operations run concurrently and independently; a
  /// failing one must not cut the others short.
  async fn handle(&self, payload: &Self::Payload) -> Vec<SubOutcome<Self::Output, Self::Error>>;
}

/// Counters reported by a worker when it exits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
  pub worker_id: usize,
  pub payloads: usize,
  pub successes: usize,
  pub failures: usize,
  pub absent: usize,
}

/// Output queue item type for a handler.
pub type HandlerResult<H> =
  Result<<H as PayloadHandler>::Output, <H as PayloadHandler>::Error>;

/// Runs one worker until it receives a sentinel on `input`.
///
/// On the sentinel, forwards exactly one sentinel to `output` and returns.
/// Every item taken from `input` is acknowledged, whatever its outcome.
#[instrument(level = "trace", skip(handler, input, output), fields(input = %input.name()))]
pub async fn run_worker<H: PayloadHandler>(
  worker_id: usize,
  handler: &H,
  input: &StageQueue<H::Payload>,
  output: &StageQueue<HandlerResult<H>>,
) -> Result<WorkerStats, QueueError> {
  let mut stats = WorkerStats {
    worker_id,
    ..WorkerStats::default()
  };

  loop {
    trace!(worker_id, "waiting for payload");
    let payload = match input.get().await? {
      StageItem::Sentinel => {
        debug!(worker_id, payloads = stats.payloads, "worker draining");
        output.put_sentinel().await?;
        input.ack()?;
        return Ok(stats);
      }
      StageItem::Item(payload) => payload,
    };

    trace!(worker_id, "dispatching sub-operations");
    for outcome in handler.handle(&payload).await {
      match outcome {
        SubOutcome::Success(value) => {
          stats.successes += 1;
          output.put_item(Ok(value)).await?;
        }
        SubOutcome::Failure(error) => {
          stats.failures += 1;
          output.put_item(Err(error)).await?;
        }
        SubOutcome::Absent => stats.absent += 1,
      }
    }
    stats.payloads += 1;
    input.ack()?;
  }
}
