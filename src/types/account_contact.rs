//! Contact record derived for one account and category.

use serde::{Deserialize, Serialize};

use super::{Account, ContactType};

/// Contact record derived for one account and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContact {
  pub account_id: String,
  pub contact_type: ContactType,
  pub email_address: String,
}

impl AccountContact {
  pub fn new(
    account_id: impl Into<String>,
    contact_type: ContactType,
    email_address: impl Into<String>,
  ) -> Self {
    Self {
      account_id: account_id.into(),
      contact_type,
      email_address: email_address.into(),
    }
  }

  /// The root contact is the account's own email; no remote call is needed.
  pub fn root(account: &Account) -> Self {
    Self::new(account.id.clone(), ContactType::Root, account.email.clone())
  }
}
