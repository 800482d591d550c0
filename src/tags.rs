//! Resource tag helpers over [OrganizationsApi].

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::api::{ApiError, OrganizationsApi};

/// Reads every tag of a resource, following pagination.
#[instrument(level = "trace", skip(api))]
pub async fn list_all_tags(
  api: &dyn OrganizationsApi,
  resource_id: &str,
) -> Result<BTreeMap<String, String>, ApiError> {
  let mut tags = BTreeMap::new();
  let mut next_token = None;
  loop {
    let page = api.list_tags_for_resource(resource_id, next_token.take()).await?;
    tags.extend(page.tags);
    match page.next_token {
      Some(token) => next_token = Some(token),
      None => return Ok(tags),
    }
  }
}

/// Adds or overwrites `tags`; other tags on the resource are kept.
#[instrument(level = "trace", skip(api))]
pub async fn merge_tags(
  api: &dyn OrganizationsApi,
  resource_id: &str,
  tags: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
  if tags.is_empty() {
    return Ok(());
  }
  api.tag_resource(resource_id, tags).await
}

/// Makes the resource's tags exactly `tags`.
#[instrument(level = "trace", skip(api))]
pub async fn replace_tags(
  api: &dyn OrganizationsApi,
  resource_id: &str,
  tags: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
  let current = list_all_tags(api, resource_id).await?;
  let stale: Vec<String> = current
    .keys()
    .filter(|k| !tags.contains_key(*k))
    .cloned()
    .collect();
  if !stale.is_empty() {
    debug!(resource_id, removed = stale.len(), "removing stale tags");
    api.untag_resource(resource_id, &stale).await?;
  }
  merge_tags(api, resource_id, tags).await
}
