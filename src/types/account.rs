//! Member account as listed by the organization directory.

use serde::{Deserialize, Serialize};

use super::AccountStatus;

/// One member account of the organization. This is the pipeline payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub id: String,
  /// Root user email address.
  pub email: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub status: AccountStatus,
}

impl Account {
  /// Creates an active account with an empty display name.
  pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      email: email.into(),
      name: String::new(),
      status: AccountStatus::Active,
    }
  }

  pub fn with_status(mut self, status: AccountStatus) -> Self {
    self.status = status;
    self
  }

  pub fn is_active(&self) -> bool {
    self.status == AccountStatus::Active
  }
}
