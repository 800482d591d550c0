//! Sequential alternate contact updater.
//!
//! For every account in an [OwnerMap], sets the BILLING, SECURITY and
//! OPERATIONS alternate contacts to the owner's email address, and optionally
//! records the owner in an account tag.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::api::{AccountApi, AlternateContact, ApiError, OrganizationsApi, PutAlternateContactRequest};
use crate::owners_io::OwnerMap;
use crate::tags::merge_tags;
use crate::types::ContactType;

/// Placeholder phone number written with every contact; the API requires one.
pub const DEFAULT_PHONE_NUMBER: &str = "0";

#[derive(Debug, Error)]
pub enum UpdateError {
  #[error("Missing account: {0}")]
  MissingAccount(String),
  #[error(transparent)]
  Api(#[from] ApiError),
}

/// Progress notifications passed to the observer of [ContactUpdater::update_all].
#[derive(Debug)]
pub enum UpdateEvent<'a> {
  Started {
    index: usize,
    account_id: &'a str,
    owner: &'a str,
  },
  Finished {
    index: usize,
    account_id: &'a str,
    owner: &'a str,
  },
  /// The account was skipped; processing continues with the next one.
  Failed {
    index: usize,
    account_id: &'a str,
    owner: &'a str,
    error: &'a UpdateError,
  },
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
  /// When set, the owner is also merged into the account's tags under this key.
  pub tag_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
  pub updated: usize,
  pub failed: usize,
}

pub struct ContactUpdater {
  orgs: Arc<dyn OrganizationsApi>,
  accounts_api: Arc<dyn AccountApi>,
  active_accounts: OnceCell<BTreeSet<String>>,
  management_account_id: OnceCell<String>,
}

impl ContactUpdater {
  pub fn new(orgs: Arc<dyn OrganizationsApi>, accounts_api: Arc<dyn AccountApi>) -> Self {
    Self {
      orgs,
      accounts_api,
      active_accounts: OnceCell::new(),
      management_account_id: OnceCell::new(),
    }
  }

  /// Ids of ACTIVE accounts, listed once and cached.
  pub async fn active_accounts(&self) -> Result<&BTreeSet<String>, ApiError> {
    self
      .active_accounts
      .get_or_try_init(|| async {
        let mut ids = BTreeSet::new();
        let mut next_token = None;
        loop {
          let page = self.orgs.list_accounts(next_token.take()).await?;
          ids.extend(
            page
              .accounts
              .into_iter()
              .filter(|a| a.is_active())
              .map(|a| a.id),
          );
          match page.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok::<_, ApiError>(ids),
          }
        }
      })
      .await
  }

  pub async fn management_account_id(&self) -> Result<&str, ApiError> {
    self
      .management_account_id
      .get_or_try_init(|| async {
        Ok::<_, ApiError>(self.orgs.describe_organization().await?.management_account_id)
      })
      .await
      .map(String::as_str)
  }

  /// Updates every account in `owners`, in map order.
  ///
  /// Unknown or inactive accounts and `ValidationException`s are reported
  /// through `observer` and skipped. Any other API error aborts the run.
  pub async fn update_all(
    &self,
    owners: &OwnerMap,
    options: &UpdateOptions,
    mut observer: impl FnMut(UpdateEvent<'_>),
  ) -> Result<UpdateSummary, UpdateError> {
    let mut summary = UpdateSummary::default();
    for (index, (account_id, owner)) in owners.iter().enumerate() {
      let outcome = if self.active_accounts().await?.contains(account_id) {
        observer(UpdateEvent::Started {
          index,
          account_id,
          owner,
        });
        self.update_account(account_id, owner, options).await
      } else {
        Err(UpdateError::MissingAccount(account_id.to_string()))
      };

      match outcome {
        Ok(()) => {
          summary.updated += 1;
          observer(UpdateEvent::Finished {
            index,
            account_id,
            owner,
          });
        }
        Err(UpdateError::Api(e)) if !e.is_validation() => return Err(UpdateError::Api(e)),
        Err(error) => {
          summary.failed += 1;
          observer(UpdateEvent::Failed {
            index,
            account_id,
            owner,
            error: &error,
          });
        }
      }
    }
    info!(updated = summary.updated, failed = summary.failed, "contact update finished");
    Ok(summary)
  }

  #[instrument(level = "trace", skip(self, options))]
  async fn update_account(
    &self,
    account_id: &str,
    owner: &str,
    options: &UpdateOptions,
  ) -> Result<(), UpdateError> {
    for contact_type in ContactType::ALTERNATES {
      self.set_alternate_contact(account_id, contact_type, owner).await?;
    }
    if let Some(key) = &options.tag_key {
      let tags = BTreeMap::from([(key.clone(), owner.to_string())]);
      merge_tags(self.orgs.as_ref(), account_id, &tags).await?;
    }
    Ok(())
  }

  /// Writes one alternate contact. The management account is addressed
  /// without an account id.
  pub async fn set_alternate_contact(
    &self,
    account_id: &str,
    contact_type: ContactType,
    email_address: &str,
  ) -> Result<(), ApiError> {
    let standalone = account_id == self.management_account_id().await?;
    let request = PutAlternateContactRequest {
      account_id: (!standalone).then(|| account_id.to_string()),
      contact: AlternateContact {
        contact_type,
        email_address: email_address.to_string(),
        name: String::new(),
        title: String::new(),
        phone_number: DEFAULT_PHONE_NUMBER.to_string(),
      },
    };
    self.accounts_api.put_alternate_contact(&request).await
  }
}
