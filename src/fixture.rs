//! In-memory organization backed by a JSON fixture.
//!
//! Implements [OrganizationsApi] and [AccountApi] with the behaviour of the
//! real services that the pipeline depends on: paginated listings, the
//! management-account standalone rule, `ResourceNotFoundException` for missing
//! contacts, and `ValidationException` for bad email addresses. Faults and
//! random latency can be injected per account.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::api::{
  ACCESS_DENIED, AccountApi, AccountPage, AlternateContact, ApiError, GetAlternateContactRequest,
  INVALID_INPUT, Organization, OrganizationsApi, PutAlternateContactRequest, TARGET_NOT_FOUND,
  TagPage,
};
use crate::types::{Account, ContactType};

/// Listing page size used when the fixture does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Error injected into alternate contact lookups for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
  pub account_id: String,
  /// Category to fail; every category when absent.
  #[serde(default)]
  pub contact_type: Option<ContactType>,
  pub code: String,
  pub message: String,
}

/// Makes the account listing fail once `after_pages` pages have been served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFault {
  pub after_pages: usize,
  pub code: String,
  pub message: String,
}

/// Serializable description of an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationFixture {
  #[serde(default)]
  pub organization_id: String,
  pub management_account_id: String,
  pub accounts: Vec<Account>,
  #[serde(default)]
  pub page_size: Option<usize>,
  /// Alternate contacts by account id.
  #[serde(default)]
  pub contacts: BTreeMap<String, Vec<AlternateContact>>,
  /// Tags by account id.
  #[serde(default)]
  pub tags: BTreeMap<String, BTreeMap<String, String>>,
  #[serde(default)]
  pub faults: Vec<Fault>,
  #[serde(default)]
  pub listing_fault: Option<ListingFault>,
  /// Upper bound of the random delay added to every contact call.
  #[serde(default)]
  pub max_latency_ms: u64,
}

/// Organization held in memory. Safe to share between workers.
#[derive(Debug)]
pub struct MemoryOrganization {
  state: Mutex<OrganizationFixture>,
  lookups: Mutex<Vec<GetAlternateContactRequest>>,
}

impl MemoryOrganization {
  pub fn new(fixture: OrganizationFixture) -> Self {
    Self {
      state: Mutex::new(fixture),
      lookups: Mutex::new(Vec::new()),
    }
  }

  /// Loads a fixture from a JSON file.
  #[instrument(level = "trace", skip(path))]
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let fixture: OrganizationFixture = serde_json::from_slice(&bytes)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Self::new(fixture))
  }

  fn state(&self) -> MutexGuard<'_, OrganizationFixture> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Every alternate contact lookup received so far, in arrival order.
  pub fn lookups(&self) -> Vec<GetAlternateContactRequest> {
    self
      .lookups
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn contacts_of(&self, account_id: &str) -> Vec<AlternateContact> {
    self.state().contacts.get(account_id).cloned().unwrap_or_default()
  }

  pub fn tags_of(&self, account_id: &str) -> BTreeMap<String, String> {
    self.state().tags.get(account_id).cloned().unwrap_or_default()
  }

  async fn simulate_latency(&self) {
    let max = self.state().max_latency_ms;
    if max == 0 {
      return;
    }
    let delay = rand::thread_rng().gen_range(0..=max);
    tokio::time::sleep(Duration::from_millis(delay)).await;
  }

  /// Resolves which account a contact request targets. Naming the management
  /// account explicitly is refused, as the account API does.
  fn target_account(
    state: &OrganizationFixture,
    account_id: Option<&str>,
  ) -> Result<String, ApiError> {
    match account_id {
      None => Ok(state.management_account_id.clone()),
      Some(id) if id == state.management_account_id => Err(ApiError::management_account_denied()),
      Some(id) if state.accounts.iter().any(|a| a.id == id) => Ok(id.to_string()),
      Some(id) => Err(ApiError::new(
        ACCESS_DENIED,
        format!("Account {id} is not a member of this organization."),
      )),
    }
  }

  fn known_resource(state: &OrganizationFixture, resource_id: &str) -> Result<(), ApiError> {
    if state.accounts.iter().any(|a| a.id == resource_id) {
      Ok(())
    } else {
      Err(ApiError::new(
        TARGET_NOT_FOUND,
        format!("Target {resource_id} does not exist."),
      ))
    }
  }
}

fn page_start(next_token: Option<&str>) -> Result<usize, ApiError> {
  match next_token {
    None => Ok(0),
    Some(token) => token
      .parse()
      .map_err(|_| ApiError::new(INVALID_INPUT, format!("Invalid pagination token: {token}"))),
  }
}

fn page_end(start: usize, page_size: usize, len: usize) -> (usize, Option<String>) {
  let end = start.saturating_add(page_size).min(len);
  let next = (end < len).then(|| end.to_string());
  (end, next)
}

#[async_trait]
impl OrganizationsApi for MemoryOrganization {
  async fn list_accounts(&self, next_token: Option<String>) -> Result<AccountPage, ApiError> {
    let state = self.state();
    let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let start = page_start(next_token.as_deref())?;
    if let Some(fault) = &state.listing_fault
      && start / page_size >= fault.after_pages
    {
      return Err(ApiError::new(fault.code.clone(), fault.message.clone()));
    }
    let (end, next_token) = page_end(start, page_size, state.accounts.len());
    Ok(AccountPage {
      accounts: state.accounts.get(start..end).unwrap_or_default().to_vec(),
      next_token,
    })
  }

  async fn describe_organization(&self) -> Result<Organization, ApiError> {
    let state = self.state();
    Ok(Organization {
      id: state.organization_id.clone(),
      management_account_id: state.management_account_id.clone(),
    })
  }

  async fn list_tags_for_resource(
    &self,
    resource_id: &str,
    next_token: Option<String>,
  ) -> Result<TagPage, ApiError> {
    let state = self.state();
    Self::known_resource(&state, resource_id)?;
    let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let start = page_start(next_token.as_deref())?;
    let all = state.tags.get(resource_id).cloned().unwrap_or_default();
    let (end, next_token) = page_end(start, page_size, all.len());
    Ok(TagPage {
      tags: all.into_iter().skip(start).take(end.saturating_sub(start)).collect(),
      next_token,
    })
  }

  async fn tag_resource(
    &self,
    resource_id: &str,
    tags: &BTreeMap<String, String>,
  ) -> Result<(), ApiError> {
    let mut state = self.state();
    Self::known_resource(&state, resource_id)?;
    let current = state.tags.entry(resource_id.to_string()).or_default();
    current.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(())
  }

  async fn untag_resource(&self, resource_id: &str, keys: &[String]) -> Result<(), ApiError> {
    let mut state = self.state();
    Self::known_resource(&state, resource_id)?;
    if let Some(current) = state.tags.get_mut(resource_id) {
      for key in keys {
        current.remove(key);
      }
    }
    Ok(())
  }
}

#[async_trait]
impl AccountApi for MemoryOrganization {
  async fn get_alternate_contact(
    &self,
    request: &GetAlternateContactRequest,
  ) -> Result<AlternateContact, ApiError> {
    self
      .lookups
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(request.clone());
    self.simulate_latency().await;

    let state = self.state();
    let target = Self::target_account(&state, request.account_id.as_deref())?;
    trace!(account_id = %target, contact_type = %request.contact_type, "get alternate contact");
    if let Some(fault) = state.faults.iter().find(|f| {
      f.account_id == target && f.contact_type.is_none_or(|ct| ct == request.contact_type)
    }) {
      return Err(ApiError::new(fault.code.clone(), fault.message.clone()));
    }
    state
      .contacts
      .get(&target)
      .and_then(|contacts| {
        contacts
          .iter()
          .find(|c| c.contact_type == request.contact_type)
      })
      .cloned()
      .ok_or_else(|| {
        ApiError::not_found("No contact of the inputted alternate contact type found.")
      })
  }

  async fn put_alternate_contact(
    &self,
    request: &PutAlternateContactRequest,
  ) -> Result<(), ApiError> {
    self.simulate_latency().await;

    let mut state = self.state();
    let target = Self::target_account(&state, request.account_id.as_deref())?;
    let contact = &request.contact;
    if !contact.contact_type.is_alternate() {
      return Err(ApiError::validation(format!(
        "Invalid alternate contact type: {}",
        contact.contact_type
      )));
    }
    if !contact.email_address.contains('@') {
      return Err(ApiError::validation(format!(
        "Invalid email address: {}",
        contact.email_address
      )));
    }
    trace!(account_id = %target, contact_type = %contact.contact_type, "put alternate contact");
    let contacts = state.contacts.entry(target).or_default();
    contacts.retain(|c| c.contact_type != contact.contact_type);
    contacts.push(contact.clone());
    Ok(())
  }
}
