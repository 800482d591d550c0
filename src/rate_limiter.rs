//! Token-bucket rate limiter shared by every worker of a pipeline run.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{instrument, trace};

use crate::error::PipelineError;

/// Published account API quota is 10 requests/s with bursts to 15. Lookups
/// still get throttled near that, so the defaults run at half of it.
pub const DEFAULT_RATE: f64 = 5.0;
pub const DEFAULT_MAX_BURST: f64 = 7.0;

#[derive(Debug)]
struct Bucket {
  tokens: f64,
  last_refill: Instant,
}

/// Token bucket: `max_burst` calls may go back-to-back, after which callers are
/// released at `rate` per second.
///
/// The bucket state lives behind a mutex; check-and-decrement is a single
/// critical section. Waiters sleep outside the lock.
#[derive(Debug)]
pub struct RateLimiter {
  rate: f64,
  max_burst: f64,
  bucket: Mutex<Bucket>,
}

impl RateLimiter {
  /// Creates a full bucket. `rate` must be positive and finite, `max_burst` at least 1.
  pub fn new(rate: f64, max_burst: f64) -> Result<Self, PipelineError> {
    if !(rate.is_finite() && rate > 0.0) {
      return Err(PipelineError::InvalidConfig(format!(
        "rate must be a positive number, got {rate}"
      )));
    }
    if !(max_burst.is_finite() && max_burst >= 1.0) {
      return Err(PipelineError::InvalidConfig(format!(
        "max_burst must be at least 1, got {max_burst}"
      )));
    }
    Ok(Self {
      rate,
      max_burst,
      bucket: Mutex::new(Bucket {
        tokens: max_burst,
        last_refill: Instant::now(),
      }),
    })
  }

  pub fn rate(&self) -> f64 {
    self.rate
  }

  pub fn max_burst(&self) -> f64 {
    self.max_burst
  }

  /// Suspends until a token is available, then takes it.
  #[instrument(level = "trace", skip(self))]
  pub async fn acquire(&self) {
    loop {
      let wait = {
        let mut bucket = self.bucket.lock().await;
        match self.take(&mut bucket) {
          Ok(()) => return,
          Err(wait) => wait,
        }
      };
      trace!(wait_ms = wait.as_millis() as u64, "rate limited");
      tokio::time::sleep(wait).await;
    }
  }

  /// Takes a token if one is available right now.
  pub async fn try_acquire(&self) -> bool {
    let mut bucket = self.bucket.lock().await;
    self.take(&mut bucket).is_ok()
  }

  /// Tokens currently in the bucket, after refill.
  pub async fn available(&self) -> f64 {
    let mut bucket = self.bucket.lock().await;
    self.refill(&mut bucket);
    bucket.tokens
  }

  fn refill(&self, bucket: &mut Bucket) {
    let now = Instant::now();
    let elapsed = now.saturating_duration_since(bucket.last_refill);
    bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.rate).min(self.max_burst);
    bucket.last_refill = now;
  }

  /// Refills, then either commits one token or returns how long until one exists.
  fn take(&self, bucket: &mut Bucket) -> Result<(), Duration> {
    self.refill(bucket);
    if bucket.tokens >= 1.0 {
      bucket.tokens -= 1.0;
      Ok(())
    } else {
      // Rates near zero overflow Duration.
      let wait = (1.0 - bucket.tokens) / self.rate;
      Err(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
    }
  }
}
