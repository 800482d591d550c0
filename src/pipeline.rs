//! Worker pool orchestrator: wires producer, workers and sink around two stage
//! queues and waits for all of them.
//!
//! ```text
//! source -> produce -> [input] -> run_worker x N -> [output] -> drain -> reporter
//! ```
//!
//! `worker_count` comes from one validated [PipelineConfig] and sets the number
//! of producer sentinels, spawned workers, and the sink's sentinel countdown.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{Instrument, info, info_span, instrument};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::producer::{PayloadSource, produce};
use crate::queue::StageQueue;
use crate::sink::{Reporter, SinkStats, drain};
use crate::worker::{PayloadHandler, WorkerStats, run_worker};

pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Pipeline shape. Capacities of `None` give unbounded queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
  pub worker_count: usize,
  pub input_capacity: Option<usize>,
  pub output_capacity: Option<usize>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      worker_count: DEFAULT_WORKER_COUNT,
      input_capacity: None,
      output_capacity: None,
    }
  }
}

impl PipelineConfig {
  pub fn with_workers(worker_count: usize) -> Self {
    Self {
      worker_count,
      ..Self::default()
    }
  }

  /// Bounds both queues to `capacity` items.
  pub fn bounded(mut self, capacity: usize) -> Self {
    self.input_capacity = Some(capacity);
    self.output_capacity = Some(capacity);
    self
  }

  pub fn validate(&self) -> Result<(), PipelineError> {
    if self.worker_count == 0 {
      return Err(PipelineError::InvalidConfig(
        "worker_count must be at least 1".to_string(),
      ));
    }
    if self.input_capacity == Some(0) || self.output_capacity == Some(0) {
      return Err(PipelineError::InvalidConfig(
        "queue capacity must be at least 1".to_string(),
      ));
    }
    Ok(())
  }
}

/// What a finished run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
  pub run_id: Uuid,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  /// Payloads pushed by the producer.
  pub payloads: usize,
  /// One entry per worker, ordered by worker id.
  pub workers: Vec<WorkerStats>,
  pub sink: SinkStats,
}

impl PipelineSummary {
  pub fn successes(&self) -> usize {
    self.sink.successes
  }

  pub fn failures(&self) -> usize {
    self.sink.failures
  }
}

enum TaskReport {
  Producer(usize),
  Worker(WorkerStats),
  Sink(SinkStats),
}

/// Producer / worker-pool / sink pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
  config: PipelineConfig,
}

impl Pipeline {
  pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// Runs the pipeline to completion.
  ///
  /// Workers and the sink are started before the producer. The first fatal
  /// error (a source failure, a closed queue, a reporter I/O error, a panicked
  /// task) is returned and the remaining tasks are aborted.
  #[instrument(level = "trace", skip_all, fields(workers = self.config.worker_count))]
  pub async fn run<S, H, R>(
    &self,
    source: S,
    handler: Arc<H>,
    mut reporter: R,
  ) -> Result<PipelineSummary, PipelineError>
  where
    S: PayloadSource<Payload = H::Payload>,
    H: PayloadHandler,
    R: Reporter<H::Output, H::Error>,
  {
    let workers = self.config.worker_count;
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("pipeline", %run_id, workers);
    info!(parent: &span, "pipeline starting");

    let input = Arc::new(StageQueue::with_capacity("input", self.config.input_capacity));
    let output = Arc::new(StageQueue::with_capacity("output", self.config.output_capacity));
    let mut tasks: JoinSet<Result<TaskReport, PipelineError>> = JoinSet::new();

    for worker_id in 0..workers {
      let handler = Arc::clone(&handler);
      let input = Arc::clone(&input);
      let output = Arc::clone(&output);
      tasks.spawn(
        async move {
          let stats = run_worker(worker_id, handler.as_ref(), &input, &output).await?;
          Ok::<_, PipelineError>(TaskReport::Worker(stats))
        }
        .instrument(span.clone()),
      );
    }

    {
      let output = Arc::clone(&output);
      tasks.spawn(
        async move {
          let stats = drain(&output, workers, &mut reporter).await?;
          Ok::<_, PipelineError>(TaskReport::Sink(stats))
        }
        .instrument(span.clone()),
      );
    }

    {
      let input = Arc::clone(&input);
      tasks.spawn(
        async move {
          let produced = produce(&source, &input, workers).await?;
          Ok::<_, PipelineError>(TaskReport::Producer(produced))
        }
        .instrument(span.clone()),
      );
    }

    let mut payloads = 0;
    let mut worker_stats = Vec::with_capacity(workers);
    let mut sink = SinkStats::default();
    while let Some(joined) = tasks.join_next().await {
      match joined?? {
        TaskReport::Producer(n) => payloads = n,
        TaskReport::Worker(stats) => worker_stats.push(stats),
        TaskReport::Sink(stats) => sink = stats,
      }
    }
    worker_stats.sort_by_key(|s| s.worker_id);

    for (name, pending) in [
      (input.name(), input.pending()),
      (output.name(), output.pending()),
    ] {
      if pending > 0 {
        return Err(PipelineError::Undrained {
          queue: name.to_string(),
          pending,
        });
      }
    }

    let summary = PipelineSummary {
      run_id,
      started_at,
      finished_at: Utc::now(),
      payloads,
      workers: worker_stats,
      sink,
    };
    info!(
      parent: &span,
      payloads = summary.payloads,
      successes = summary.successes(),
      failures = summary.failures(),
      "pipeline finished"
    );
    Ok(summary)
  }
}
