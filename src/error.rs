//! Pipeline-level errors. These are the fatal ones; per-item failures travel as
//! [crate::types::CapturedError] values instead.

use thiserror::Error;

/// Error from a [crate::queue::StageQueue] operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
  #[error("queue '{0}' is closed")]
  Closed(String),
  #[error("more acks than puts on queue '{0}'")]
  TooManyAcks(String),
}

/// Error that aborts a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("invalid pipeline configuration: {0}")]
  InvalidConfig(String),
  #[error("payload source failed: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error(transparent)]
  Queue(#[from] QueueError),
  #[error("reporter failed: {0}")]
  Report(#[source] std::io::Error),
  #[error("{queue} queue left {pending} unacknowledged item(s) after shutdown")]
  Undrained { queue: String, pending: usize },
  #[error("pipeline task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}
