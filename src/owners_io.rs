//! Owner map: newline-delimited JSON records of `{"account_id", "workload_owner"}`.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum OwnerMapError {
  #[error("cannot read owner map {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("owner map line {line}: {source}")]
  Parse {
    line: usize,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Deserialize)]
struct OwnerRecord {
  account_id: String,
  workload_owner: String,
}

/// Account id to owner email, in first-seen order. A repeated account id keeps
/// its position and takes the later owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerMap {
  entries: Vec<(String, String)>,
}

impl OwnerMap {
  pub fn insert(&mut self, account_id: impl Into<String>, owner: impl Into<String>) {
    let account_id = account_id.into();
    let owner = owner.into();
    match self.entries.iter_mut().find(|(id, _)| *id == account_id) {
      Some(entry) => entry.1 = owner,
      None => self.entries.push((account_id, owner)),
    }
  }

  pub fn get(&self, account_id: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(id, _)| id == account_id)
      .map(|(_, owner)| owner.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(id, owner)| (id.as_str(), owner.as_str()))
  }
}

impl<A: Into<String>, O: Into<String>> FromIterator<(A, O)> for OwnerMap {
  fn from_iter<I: IntoIterator<Item = (A, O)>>(iter: I) -> Self {
    let mut map = OwnerMap::default();
    for (account_id, owner) in iter {
      map.insert(account_id, owner);
    }
    map
  }
}

/// Parses owner records, one JSON object per line. Blank lines are skipped.
pub fn parse_owner_map(reader: impl BufRead) -> Result<OwnerMap, OwnerMapError> {
  let mut map = OwnerMap::default();
  for (index, line) in reader.lines().enumerate() {
    let line = line.map_err(|source| OwnerMapError::Io {
      path: PathBuf::new(),
      source,
    })?;
    if line.trim().is_empty() {
      continue;
    }
    let record: OwnerRecord = serde_json::from_str(&line).map_err(|source| OwnerMapError::Parse {
      line: index + 1,
      source,
    })?;
    map.insert(record.account_id, record.workload_owner);
  }
  Ok(map)
}

/// Reads an owner map file.
#[instrument(level = "trace")]
pub fn load_owner_map(path: &Path) -> Result<OwnerMap, OwnerMapError> {
  let io_err = |source| OwnerMapError::Io {
    path: path.to_path_buf(),
    source,
  };
  let file = std::fs::File::open(path).map_err(io_err)?;
  match parse_owner_map(std::io::BufReader::new(file)) {
    Err(OwnerMapError::Io { source, .. }) => Err(io_err(source)),
    other => other,
  }
}
