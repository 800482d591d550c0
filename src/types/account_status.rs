//! Lifecycle status of a member account.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
  #[default]
  Active,
  Suspended,
  PendingClosure,
}

impl fmt::Display for AccountStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AccountStatus::Active => write!(f, "ACTIVE"),
      AccountStatus::Suspended => write!(f, "SUSPENDED"),
      AccountStatus::PendingClosure => write!(f, "PENDING_CLOSURE"),
    }
  }
}
