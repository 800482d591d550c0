//! Sink consumer: drains the result queue until every worker has sent its
//! sentinel.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::queue::{StageItem, StageQueue};

/// Renders pipeline results. Both methods count the value as handled.
pub trait Reporter<O, E>: Send + 'static {
  fn success(&mut self, value: &O) -> std::io::Result<()>;

  fn failure(&mut self, error: &E) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
  pub successes: usize,
  pub failures: usize,
  pub sentinels: usize,
}

/// Drains `queue`, handing results to `reporter`, and stops right after the
/// `sentinels`-th sentinel.
#[instrument(level = "trace", skip(queue, reporter), fields(queue = %queue.name()))]
pub async fn drain<O, E, R>(
  queue: &StageQueue<Result<O, E>>,
  sentinels: usize,
  reporter: &mut R,
) -> Result<SinkStats, PipelineError>
where
  O: Send,
  E: Send,
  R: Reporter<O, E>,
{
  let mut stats = SinkStats::default();
  let mut remaining = sentinels;

  while remaining > 0 {
    match queue.get().await? {
      StageItem::Sentinel => {
        remaining -= 1;
        stats.sentinels += 1;
        debug!(remaining, "sentinel received");
      }
      StageItem::Item(Ok(value)) => {
        stats.successes += 1;
        reporter.success(&value).map_err(PipelineError::Report)?;
      }
      StageItem::Item(Err(error)) => {
        stats.failures += 1;
        reporter.failure(&error).map_err(PipelineError::Report)?;
      }
    }
    queue.ack()?;
  }
  Ok(stats)
}
