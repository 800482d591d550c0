//! Tests for `MemoryOrganization`.

use std::collections::BTreeMap;

use crate::api::{
  AccountApi, GetAlternateContactRequest, OrganizationsApi, PutAlternateContactRequest,
};
use crate::fixture::MemoryOrganization;
use crate::test_utils::{MANAGEMENT_ID, account_id, alternate, organization};
use crate::types::ContactType;

#[tokio::test]
async fn list_accounts_pages_with_tokens() {
  let org = MemoryOrganization::new(organization(4));
  let first = org.list_accounts(None).await.unwrap();
  assert_eq!(first.accounts.len(), 2);
  assert_eq!(first.next_token.as_deref(), Some("2"));
  let second = org.list_accounts(first.next_token).await.unwrap();
  let third = org.list_accounts(second.next_token).await.unwrap();
  assert_eq!(third.accounts.len(), 1);
  assert!(third.next_token.is_none());
}

#[tokio::test]
async fn bad_token_is_invalid_input() {
  let org = MemoryOrganization::new(organization(1));
  let err = org.list_accounts(Some("abc".to_string())).await.unwrap_err();
  assert_eq!(err.code, "InvalidInputException");
}

#[tokio::test]
async fn token_past_the_end_yields_an_empty_last_page() {
  let org = MemoryOrganization::new(organization(3));
  let page = org.list_accounts(Some(usize::MAX.to_string())).await.unwrap();
  assert!(page.accounts.is_empty());
  assert!(page.next_token.is_none());
}

#[tokio::test]
async fn naming_the_management_account_is_denied() {
  let org = MemoryOrganization::new(organization(1));
  let err = org
    .get_alternate_contact(&GetAlternateContactRequest::for_account(
      MANAGEMENT_ID,
      ContactType::Billing,
    ))
    .await
    .unwrap_err();
  assert!(err.is_management_account_denial());
}

#[tokio::test]
async fn unknown_account_is_denied_but_not_as_management() {
  let org = MemoryOrganization::new(organization(1));
  let err = org
    .get_alternate_contact(&GetAlternateContactRequest::for_account(
      "999",
      ContactType::Billing,
    ))
    .await
    .unwrap_err();
  assert_eq!(err.code, "AccessDeniedException");
  assert!(!err.is_management_account_denial());
}

#[tokio::test]
async fn put_then_get_round_trips_and_validates_email() {
  let org = MemoryOrganization::new(organization(1));
  let id = account_id(0);
  let put = PutAlternateContactRequest {
    account_id: Some(id.clone()),
    contact: alternate(ContactType::Operations, "ops@example.com"),
  };
  org.put_alternate_contact(&put).await.unwrap();
  let got = org
    .get_alternate_contact(&GetAlternateContactRequest::for_account(
      id.clone(),
      ContactType::Operations,
    ))
    .await
    .unwrap();
  assert_eq!(got.email_address, "ops@example.com");

  let bad = PutAlternateContactRequest {
    account_id: Some(id.clone()),
    contact: alternate(ContactType::Operations, "nobody"),
  };
  assert!(org.put_alternate_contact(&bad).await.unwrap_err().is_validation());
  assert_eq!(org.contacts_of(&id).len(), 1);
}

#[tokio::test]
async fn tags_are_paginated_and_mutable() {
  let org = MemoryOrganization::new(organization(1));
  let id = account_id(0);
  let tags: BTreeMap<String, String> = (0..3).map(|i| (format!("k{i}"), format!("v{i}"))).collect();
  org.tag_resource(&id, &tags).await.unwrap();

  let first = org.list_tags_for_resource(&id, None).await.unwrap();
  assert_eq!(first.tags.len(), 2);
  let second = org
    .list_tags_for_resource(&id, first.next_token)
    .await
    .unwrap();
  assert_eq!(second.tags.len(), 1);
  assert!(second.next_token.is_none());

  org.untag_resource(&id, &["k0".to_string()]).await.unwrap();
  assert_eq!(org.tags_of(&id).len(), 2);

  let err = org.tag_resource("404", &tags).await.unwrap_err();
  assert_eq!(err.code, "TargetNotFoundException");
}

#[tokio::test]
async fn describe_organization_reports_management_account() {
  let org = MemoryOrganization::new(organization(0));
  let described = org.describe_organization().await.unwrap();
  assert_eq!(described.management_account_id, MANAGEMENT_ID);
  assert_eq!(described.id, "o-test");
}

#[test]
fn load_reads_json_fixture() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("org.json");
  std::fs::write(
    &path,
    r#"{
      "management_account_id": "111",
      "accounts": [
        {"id": "111", "email": "root@example.com"},
        {"id": "222", "email": "dev@example.com", "status": "SUSPENDED"}
      ],
      "contacts": {"222": [{"contact_type": "BILLING", "email_address": "b@example.com"}]},
      "faults": [{"account_id": "222", "code": "ThrottlingException", "message": "slow"}]
    }"#,
  )
  .unwrap();
  let org = MemoryOrganization::load(&path).unwrap();
  assert_eq!(org.contacts_of("222").len(), 1);
}

#[test]
fn load_rejects_invalid_json() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("org.json");
  std::fs::write(&path, "{not json").unwrap();
  let err = MemoryOrganization::load(&path).unwrap_err();
  assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
