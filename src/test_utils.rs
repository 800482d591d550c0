//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{AlternateContact, TOO_MANY_REQUESTS};
use crate::fixture::{Fault, MemoryOrganization, OrganizationFixture};
use crate::rate_limiter::RateLimiter;
use crate::types::{Account, ContactType};

pub const MANAGEMENT_ID: &str = "000000000000";

pub fn account_id(n: usize) -> String {
  format!("1000000000{n:02}")
}

pub fn alternate(contact_type: ContactType, email: &str) -> AlternateContact {
  AlternateContact {
    contact_type,
    email_address: email.to_string(),
    name: String::new(),
    title: String::new(),
    phone_number: String::new(),
  }
}

/// Management account plus `members` member accounts, none with contacts.
pub fn organization(members: usize) -> OrganizationFixture {
  let mut accounts = vec![Account::new(MANAGEMENT_ID, "root@example.com")];
  accounts.extend((0..members).map(|n| Account::new(account_id(n), format!("root+{n}@example.com"))));
  OrganizationFixture {
    organization_id: "o-test".to_string(),
    management_account_id: MANAGEMENT_ID.to_string(),
    accounts,
    page_size: Some(2),
    contacts: BTreeMap::new(),
    tags: BTreeMap::new(),
    faults: Vec::new(),
    listing_fault: None,
    max_latency_ms: 0,
  }
}

/// `members` accounts (no management account in the listing), each with a
/// BILLING contact, no SECURITY contact, and a failing OPERATIONS lookup.
pub fn mixed_outcome_organization(members: usize) -> OrganizationFixture {
  let mut fixture = organization(members);
  fixture.accounts.retain(|a| a.id != MANAGEMENT_ID);
  for account in &fixture.accounts {
    fixture.contacts.insert(
      account.id.clone(),
      vec![alternate(ContactType::Billing, &format!("billing+{}@example.com", account.id))],
    );
    fixture.faults.push(Fault {
      account_id: account.id.clone(),
      contact_type: Some(ContactType::Operations),
      code: TOO_MANY_REQUESTS.to_string(),
      message: "Rate exceeded".to_string(),
    });
  }
  fixture
}

pub fn memory_org(fixture: OrganizationFixture) -> Arc<MemoryOrganization> {
  Arc::new(MemoryOrganization::new(fixture))
}

/// Limiter that never throttles in tests.
pub fn unthrottled() -> Arc<RateLimiter> {
  Arc::new(RateLimiter::new(1_000_000.0, 1_000.0).expect("valid limiter"))
}
