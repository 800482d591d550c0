//! A failed sub-operation, carried as a value on the result queue.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ContactType;

/// A failed sub-operation turned into data so it can travel next to successes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
  pub account_id: String,
  /// Category whose lookup failed, if the failure is tied to one.
  pub contact_type: Option<ContactType>,
  pub message: String,
}

impl CapturedError {
  pub fn new(
    account_id: impl Into<String>,
    contact_type: Option<ContactType>,
    error: impl fmt::Display,
  ) -> Self {
    Self {
      account_id: account_id.into(),
      contact_type,
      message: error.to_string(),
    }
  }
}

impl fmt::Display for CapturedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.contact_type {
      Some(ct) => write!(f, "account {} ({}): {}", self.account_id, ct, self.message),
      None => write!(f, "account {}: {}", self.account_id, self.message),
    }
  }
}

impl std::error::Error for CapturedError {}
