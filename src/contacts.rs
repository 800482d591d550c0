//! Account contact resolution: the payload source and per-account handler that
//! plug organization accounts into the generic pipeline.

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::Stream;
use futures::future::join_all;
use futures::stream::BoxStream;
use tracing::{debug, instrument, warn};

use crate::api::{AccountApi, ApiError, GetAlternateContactRequest, OrganizationsApi};
use crate::producer::PayloadSource;
use crate::rate_limiter::RateLimiter;
use crate::types::{Account, AccountContact, CapturedError, ContactType};
use crate::worker::{PayloadHandler, SubOutcome};

/// Lists organization accounts page by page.
#[derive(Clone)]
pub struct AccountLister {
  api: Arc<dyn OrganizationsApi>,
  active_only: bool,
}

impl AccountLister {
  pub fn new(api: Arc<dyn OrganizationsApi>) -> Self {
    Self {
      api,
      active_only: false,
    }
  }

  /// Skips accounts whose status is not `ACTIVE`.
  pub fn active_only(mut self) -> Self {
    self.active_only = true;
    self
  }
}

fn list_accounts(
  api: Arc<dyn OrganizationsApi>,
  active_only: bool,
) -> impl Stream<Item = Result<Account, ApiError>> + Send + 'static {
  try_stream! {
    let mut next_token = None;
    let mut page_number = 0usize;
    loop {
      let page = api.list_accounts(next_token.take()).await?;
      page_number += 1;
      debug!(page = page_number, accounts = page.accounts.len(), "account page");
      for account in page.accounts {
        if !active_only || account.is_active() {
          yield account;
        }
      }
      match page.next_token {
        Some(token) => next_token = Some(token),
        None => break,
      }
    }
  }
}

impl PayloadSource for AccountLister {
  type Payload = Account;
  type Error = ApiError;

  fn payloads(&self) -> BoxStream<'_, Result<Account, ApiError>> {
    Box::pin(list_accounts(Arc::clone(&self.api), self.active_only))
  }
}

/// Resolves the root contact and the three alternate contacts of an account.
///
/// Every alternate lookup waits on the shared [RateLimiter] right before each
/// remote call, retries included.
pub struct ContactResolver {
  api: Arc<dyn AccountApi>,
  limiter: Arc<RateLimiter>,
}

impl ContactResolver {
  pub fn new(api: Arc<dyn AccountApi>, limiter: Arc<RateLimiter>) -> Self {
    Self { api, limiter }
  }

  /// Fetches one alternate contact. `Ok(None)` when the account has none.
  ///
  /// A request naming the management account is rejected by the API; it is
  /// retried once without the account id.
  #[instrument(level = "trace", skip(self, account), fields(account_id = %account.id))]
  pub async fn alternate_contact(
    &self,
    account: &Account,
    contact_type: ContactType,
  ) -> Result<Option<AccountContact>, ApiError> {
    let mut request = GetAlternateContactRequest::for_account(account.id.clone(), contact_type);
    loop {
      self.limiter.acquire().await;
      match self.api.get_alternate_contact(&request).await {
        Ok(contact) => {
          return Ok(Some(AccountContact::new(
            account.id.clone(),
            contact.contact_type,
            contact.email_address,
          )));
        }
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) if e.is_management_account_denial() && request.account_id.is_some() => {
          debug!(account_id = %account.id, %contact_type, "management account, retrying standalone");
          request = GetAlternateContactRequest::standalone(contact_type);
        }
        Err(e) => return Err(e),
      }
    }
  }

  async fn alternate_outcome(
    &self,
    account: &Account,
    contact_type: ContactType,
  ) -> SubOutcome<AccountContact, CapturedError> {
    self
      .alternate_contact(account, contact_type)
      .await
      .map_err(|e| {
        warn!(account_id = %account.id, %contact_type, error = %e, "contact lookup failed");
        CapturedError::new(account.id.clone(), Some(contact_type), e)
      })
      .into()
  }
}

#[async_trait]
impl PayloadHandler for ContactResolver {
  type Payload = Account;
  type Output = AccountContact;
  type Error = CapturedError;

  async fn handle(&self, account: &Account) -> Vec<SubOutcome<AccountContact, CapturedError>> {
    let lookups = ContactType::ALTERNATES
      .into_iter()
      .map(|contact_type| self.alternate_outcome(account, contact_type));
    let alternates = join_all(lookups).await;

    let mut outcomes = Vec::with_capacity(alternates.len() + 1);
    outcomes.push(SubOutcome::Success(AccountContact::root(account)));
    outcomes.extend(alternates);
    outcomes
  }
}
