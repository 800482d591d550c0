//! # org-contacts
//!
//! Concurrent, rate-limited collection of organization account contacts.
//!
//! ## Architecture
//!
//! A generic three-stage pipeline ([pipeline]) moves payloads from a
//! [producer::PayloadSource] through a fixed pool of fan-out workers
//! ([worker]) into a [sink::Reporter]. Stages talk over [queue::StageQueue]s
//! and signal end of input with in-band sentinels. Per-item failures are
//! values on the result queue, never errors that stop the run.
//!
//! [contacts] plugs organization accounts into that pipeline: each account fans
//! out into its root contact and three alternate contact lookups, all gated by a
//! shared [rate_limiter::RateLimiter].
//!
//! The sequential [updater] writes alternate contacts from an owner map
//! ([owners_io]) and can record owners as account tags ([tags]).

pub mod api;
pub mod contacts;
pub mod error;
pub mod fixture;
#[cfg(test)]
mod fixture_test;
pub mod owners_io;
#[cfg(test)]
mod owners_io_test;
pub mod pipeline;
#[cfg(test)]
mod pipeline_test;
pub mod producer;
pub mod queue;
pub mod rate_limiter;
pub mod reporter;
#[cfg(test)]
mod reporter_test;
pub mod sink;
pub mod tags;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod types;
pub mod updater;
pub mod worker;

pub use contacts::{AccountLister, ContactResolver};
pub use error::{PipelineError, QueueError};
pub use fixture::{MemoryOrganization, OrganizationFixture};
pub use pipeline::{Pipeline, PipelineConfig, PipelineSummary};
pub use rate_limiter::RateLimiter;
pub use types::{Account, AccountContact, CapturedError, ContactType, ResultItem};
