//! Source producer: pushes every payload of a source onto the input queue, then
//! one sentinel per worker.

use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::queue::StageQueue;

/// Lazy sequence of payloads, usually flattened from a paginated listing.
///
/// Each call to [PayloadSource::payloads] starts a fresh listing.
pub trait PayloadSource: Send + Sync + 'static {
  type Payload: Send + 'static;
  type Error: std::error::Error + Send + Sync + 'static;

  fn payloads(&self) -> BoxStream<'_, Result<Self::Payload, Self::Error>>;
}

/// Pushes all payloads in listing order, then `sentinels` sentinels.
///
/// A listing error is not retried: it is returned as [PipelineError::Source]
/// and no sentinels are sent.
#[instrument(level = "trace", skip(source, queue), fields(queue = %queue.name()))]
pub async fn produce<S: PayloadSource>(
  source: &S,
  queue: &StageQueue<S::Payload>,
  sentinels: usize,
) -> Result<usize, PipelineError> {
  let mut produced = 0;
  let mut payloads = source.payloads();
  while let Some(payload) = payloads.next().await {
    let payload = payload.map_err(|e| PipelineError::Source(Box::new(e)))?;
    queue.put_item(payload).await?;
    produced += 1;
  }

  debug!(produced, sentinels, "source exhausted");
  for _ in 0..sentinels {
    queue.put_sentinel().await?;
  }
  Ok(produced)
}
