//! Stage queue: FIFO channel between pipeline stages.
//!
//! Items are either a payload or a [StageItem::Sentinel]. Every `get` must be
//! paired with one `ack`, so [StageQueue::join] can wait until everything put on
//! the queue has been processed.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{instrument, trace};

use crate::error::QueueError;

/// An item on a stage queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageItem<T> {
  Item(T),
  /// No more items will follow from this producer.
  Sentinel,
}

impl<T> StageItem<T> {
  pub fn is_sentinel(&self) -> bool {
    matches!(self, StageItem::Sentinel)
  }
}

enum Sender<T> {
  Bounded(mpsc::Sender<StageItem<T>>),
  Unbounded(mpsc::UnboundedSender<StageItem<T>>),
}

enum Receiver<T> {
  Bounded(mpsc::Receiver<StageItem<T>>),
  Unbounded(mpsc::UnboundedReceiver<StageItem<T>>),
}

impl<T> Receiver<T> {
  async fn recv(&mut self) -> Option<StageItem<T>> {
    match self {
      Receiver::Bounded(rx) => rx.recv().await,
      Receiver::Unbounded(rx) => rx.recv().await,
    }
  }
}

/// Multi-producer, multi-consumer FIFO queue shared via `Arc`.
///
/// Consumers take turns on the receiving end, so each item is delivered to
/// exactly one `get` caller.
pub struct StageQueue<T> {
  name: String,
  tx: Sender<T>,
  rx: Mutex<Receiver<T>>,
  unfinished: AtomicUsize,
  drained: Notify,
}

impl<T: Send> StageQueue<T> {
  /// Creates a queue whose `put` suspends once `capacity` items are waiting.
  ///
  /// # Panics
  /// Panics if `capacity` is zero. [crate::pipeline::PipelineConfig] validates
  /// capacities before queues are built.
  pub fn bounded(name: impl Into<String>, capacity: usize) -> Self {
    let (tx, rx) = mpsc::channel(capacity);
    Self::from_parts(name.into(), Sender::Bounded(tx), Receiver::Bounded(rx))
  }

  /// Creates a queue whose `put` never suspends.
  pub fn unbounded(name: impl Into<String>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self::from_parts(name.into(), Sender::Unbounded(tx), Receiver::Unbounded(rx))
  }

  /// Bounded when `capacity` is `Some`, unbounded otherwise.
  pub fn with_capacity(name: impl Into<String>, capacity: Option<usize>) -> Self {
    match capacity {
      Some(c) => Self::bounded(name, c),
      None => Self::unbounded(name),
    }
  }

  fn from_parts(name: String, tx: Sender<T>, rx: Receiver<T>) -> Self {
    Self {
      name,
      tx,
      rx: Mutex::new(rx),
      unfinished: AtomicUsize::new(0),
      drained: Notify::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of items put but not yet acknowledged.
  pub fn pending(&self) -> usize {
    self.unfinished.load(Ordering::SeqCst)
  }

  /// Enqueues an item, suspending while a bounded queue is full.
  pub async fn put(&self, item: StageItem<T>) -> Result<(), QueueError> {
    self.unfinished.fetch_add(1, Ordering::SeqCst);
    let sent = match &self.tx {
      Sender::Bounded(tx) => tx.send(item).await.is_ok(),
      Sender::Unbounded(tx) => tx.send(item).is_ok(),
    };
    if !sent {
      self.unfinished.fetch_sub(1, Ordering::SeqCst);
      return Err(QueueError::Closed(self.name.clone()));
    }
    Ok(())
  }

  pub async fn put_item(&self, item: T) -> Result<(), QueueError> {
    self.put(StageItem::Item(item)).await
  }

  pub async fn put_sentinel(&self) -> Result<(), QueueError> {
    self.put(StageItem::Sentinel).await
  }

  /// Dequeues the oldest item, suspending while the queue is empty.
  pub async fn get(&self) -> Result<StageItem<T>, QueueError> {
    let mut rx = self.rx.lock().await;
    rx.recv()
      .await
      .ok_or_else(|| QueueError::Closed(self.name.clone()))
  }

  /// Marks one item as fully processed.
  ///
  /// Only acks beyond the number of puts are rejected; an ack is not matched
  /// against a specific get.
  pub fn ack(&self) -> Result<(), QueueError> {
    let previous = self
      .unfinished
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .map_err(|_| QueueError::TooManyAcks(self.name.clone()))?;
    if previous == 1 {
      trace!(queue = %self.name, "queue drained");
      self.drained.notify_waiters();
    }
    Ok(())
  }

  /// Waits until every item put on the queue has been acknowledged.
  #[instrument(level = "trace", skip(self), fields(queue = %self.name))]
  pub async fn join(&self) {
    loop {
      let notified = self.drained.notified();
      tokio::pin!(notified);
      notified.as_mut().enable();
      if self.pending() == 0 {
        return;
      }
      notified.await;
    }
  }
}
