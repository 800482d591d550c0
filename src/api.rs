//! Remote directory and contact API, as seen by the pipeline.
//!
//! [OrganizationsApi] lists accounts and manages tags; [AccountApi] reads and
//! writes alternate contacts. Both report failures as [ApiError] with a service
//! error code, so callers can match the conditions they handle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Account, ContactType};

pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const ACCESS_DENIED: &str = "AccessDeniedException";
pub const VALIDATION: &str = "ValidationException";
pub const TOO_MANY_REQUESTS: &str = "TooManyRequestsException";
pub const TARGET_NOT_FOUND: &str = "TargetNotFoundException";
pub const INVALID_INPUT: &str = "InvalidInputException";

/// Message fragment the account API returns when a request names the
/// management account explicitly. Such requests must omit the account id.
pub const MANAGEMENT_ACCOUNT_MESSAGE: &str = "The management account can only be managed using the standalone context from the management account.";

/// Error reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
  pub code: String,
  pub message: String,
}

impl ApiError {
  pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      message: message.into(),
    }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(RESOURCE_NOT_FOUND, message)
  }

  pub fn management_account_denied() -> Self {
    Self::new(ACCESS_DENIED, MANAGEMENT_ACCOUNT_MESSAGE)
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::new(VALIDATION, message)
  }

  pub fn is_not_found(&self) -> bool {
    self.code == RESOURCE_NOT_FOUND
  }

  /// True for the access denial that asks for the standalone management context.
  pub fn is_management_account_denial(&self) -> bool {
    self.code == ACCESS_DENIED && self.message.contains(MANAGEMENT_ACCOUNT_MESSAGE)
  }

  pub fn is_validation(&self) -> bool {
    self.code == VALIDATION
  }
}

/// One page of the account listing.
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
  pub accounts: Vec<Account>,
  pub next_token: Option<String>,
}

/// One page of a resource's tags.
#[derive(Debug, Clone, Default)]
pub struct TagPage {
  pub tags: BTreeMap<String, String>,
  pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub id: String,
  pub management_account_id: String,
}

/// Alternate contact as stored by the account API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateContact {
  pub contact_type: ContactType,
  pub email_address: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub phone_number: String,
}

/// Alternate contact lookup. `account_id: None` addresses the caller's own
/// account (the standalone context).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAlternateContactRequest {
  pub account_id: Option<String>,
  pub contact_type: ContactType,
}

impl GetAlternateContactRequest {
  pub fn for_account(account_id: impl Into<String>, contact_type: ContactType) -> Self {
    Self {
      account_id: Some(account_id.into()),
      contact_type,
    }
  }

  pub fn standalone(contact_type: ContactType) -> Self {
    Self {
      account_id: None,
      contact_type,
    }
  }
}

/// Alternate contact write. `account_id: None` writes the caller's own account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutAlternateContactRequest {
  pub account_id: Option<String>,
  pub contact: AlternateContact,
}

/// Organization directory: account listing, organization metadata and tags.
#[async_trait]
pub trait OrganizationsApi: Send + Sync {
  async fn list_accounts(&self, next_token: Option<String>) -> Result<AccountPage, ApiError>;

  async fn describe_organization(&self) -> Result<Organization, ApiError>;

  async fn list_tags_for_resource(
    &self,
    resource_id: &str,
    next_token: Option<String>,
  ) -> Result<TagPage, ApiError>;

  /// Adds or overwrites the given tags.
  async fn tag_resource(
    &self,
    resource_id: &str,
    tags: &BTreeMap<String, String>,
  ) -> Result<(), ApiError>;

  async fn untag_resource(&self, resource_id: &str, keys: &[String]) -> Result<(), ApiError>;
}

/// Alternate contact API for member accounts.
#[async_trait]
pub trait AccountApi: Send + Sync {
  async fn get_alternate_contact(
    &self,
    request: &GetAlternateContactRequest,
  ) -> Result<AlternateContact, ApiError>;

  async fn put_alternate_contact(&self, request: &PutAlternateContactRequest)
  -> Result<(), ApiError>;
}
