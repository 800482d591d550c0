//! Contact categories resolved for each account.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contact category. `Root` is derived locally from the account record; the
/// others are alternate contacts fetched from the account API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContactType {
  Root,
  Billing,
  Security,
  Operations,
}

impl ContactType {
  /// Alternate contact categories, in lookup order.
  pub const ALTERNATES: [ContactType; 3] = [
    ContactType::Billing,
    ContactType::Security,
    ContactType::Operations,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ContactType::Root => "ROOT",
      ContactType::Billing => "BILLING",
      ContactType::Security => "SECURITY",
      ContactType::Operations => "OPERATIONS",
    }
  }

  pub fn is_alternate(&self) -> bool {
    !matches!(self, ContactType::Root)
  }
}

impl fmt::Display for ContactType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
