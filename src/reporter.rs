//! Reporters for contact results.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::sink::Reporter;
use crate::types::{AccountContact, CapturedError, ContactType};

#[derive(Serialize)]
struct ErrorLine<'a> {
  account_id: &'a str,
  contact_type: Option<ContactType>,
  error: &'a str,
}

/// Writes one JSON object per line and flushes after each one.
///
/// Contacts are written as `{"account_id","contact_type","email_address"}`,
/// failures as `{"account_id","contact_type","error"}`.
pub struct JsonLinesReporter<W> {
  out: W,
}

impl<W: Write> JsonLinesReporter<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  fn write_line(&mut self, value: &impl Serialize) -> std::io::Result<()> {
    serde_json::to_writer(&mut self.out, value)?;
    self.out.write_all(b"\n")?;
    self.out.flush()
  }
}

impl JsonLinesReporter<std::io::Stdout> {
  pub fn stdout() -> Self {
    Self::new(std::io::stdout())
  }
}

impl<W: Write + Send + 'static> Reporter<AccountContact, CapturedError> for JsonLinesReporter<W> {
  fn success(&mut self, value: &AccountContact) -> std::io::Result<()> {
    self.write_line(value)
  }

  fn failure(&mut self, error: &CapturedError) -> std::io::Result<()> {
    self.write_line(&ErrorLine {
      account_id: &error.account_id,
      contact_type: error.contact_type,
      error: &error.message,
    })
  }
}

#[derive(Debug)]
struct Collected<O, E> {
  successes: Vec<O>,
  failures: Vec<E>,
}

/// Keeps results in memory. Clones share the same storage, so a clone kept by
/// the caller sees what the pipeline's copy collected.
#[derive(Debug)]
pub struct MemoryReporter<O, E> {
  inner: Arc<Mutex<Collected<O, E>>>,
}

impl<O, E> Clone for MemoryReporter<O, E> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<O, E> Default for MemoryReporter<O, E> {
  fn default() -> Self {
    Self {
      inner: Arc::new(Mutex::new(Collected {
        successes: Vec::new(),
        failures: Vec::new(),
      })),
    }
  }
}

impl<O: Clone, E: Clone> MemoryReporter<O, E> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn successes(&self) -> Vec<O> {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .successes
      .clone()
  }

  pub fn failures(&self) -> Vec<E> {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .failures
      .clone()
  }
}

impl<O, E> Reporter<O, E> for MemoryReporter<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn success(&mut self, value: &O) -> std::io::Result<()> {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .successes
      .push(value.clone());
    Ok(())
  }

  fn failure(&mut self, error: &E) -> std::io::Result<()> {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .failures
      .push(error.clone());
    Ok(())
  }
}
