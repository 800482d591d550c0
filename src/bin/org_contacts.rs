//! CLI: report or update organization account contacts.
//!
//! Usage:
//!   `org_contacts report --org <fixture.json> [--workers N] [--rate R] [--burst B]`
//!   `org_contacts update --org <fixture.json> --owners <owners.jsonl> [--tag-key KEY]`
//!
//! `report` runs the concurrent pipeline and prints one JSON line per contact or
//! captured error on stdout. Logs go to stderr.
//!
//! Set RUST_LOG=org_contacts=trace for TRACE-level span enter/exit and events.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use org_contacts::owners_io::load_owner_map;
use org_contacts::pipeline::DEFAULT_WORKER_COUNT;
use org_contacts::rate_limiter::{DEFAULT_MAX_BURST, DEFAULT_RATE};
use org_contacts::reporter::JsonLinesReporter;
use org_contacts::updater::{ContactUpdater, UpdateEvent, UpdateOptions};
use org_contacts::{
  AccountLister, ContactResolver, MemoryOrganization, Pipeline, PipelineConfig, RateLimiter,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Report or update organization account contacts.
#[derive(Parser, Debug)]
#[command(name = "org_contacts")]
#[command(
  after_help = r#"Environment variables (override the matching flags when set):
  ORG_CONTACTS_WORKERS  Number of concurrent workers for `report`.
  ORG_CONTACTS_RATE     Alternate contact lookups per second.
  ORG_CONTACTS_BURST    Lookups allowed back-to-back before throttling.

Examples:
  org_contacts report --org org.json
  org_contacts update --org org.json --owners owners.jsonl --tag-key workload-owner"#
)]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the root and alternate contacts of every account as JSON lines.
  Report {
    /// Organization fixture (JSON).
    #[arg(long, value_name = "FILE")]
    org: PathBuf,

    /// Concurrent workers. Overridden by ORG_CONTACTS_WORKERS if set.
    #[arg(long, default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,

    /// Lookups per second. Overridden by ORG_CONTACTS_RATE if set.
    #[arg(long, default_value_t = DEFAULT_RATE)]
    rate: f64,

    /// Burst size. Overridden by ORG_CONTACTS_BURST if set.
    #[arg(long, default_value_t = DEFAULT_MAX_BURST)]
    burst: f64,

    /// Bound both pipeline queues to this many items (unbounded by default).
    #[arg(long, value_name = "N")]
    queue_capacity: Option<usize>,

    /// Only report ACTIVE accounts.
    #[arg(long)]
    active_only: bool,
  },
  /// Set BILLING, SECURITY and OPERATIONS contacts from an owner map.
  Update {
    /// Organization fixture (JSON).
    #[arg(long, value_name = "FILE")]
    org: PathBuf,

    /// Newline-delimited JSON records of {"account_id", "workload_owner"}.
    #[arg(long, value_name = "JSONL")]
    owners: PathBuf,

    /// Also merge the owner into this account tag.
    #[arg(long, value_name = "KEY")]
    tag_key: Option<String>,
  },
}

/// Reads `name` from the environment, falling back to `flag` when unset.
fn env_override<T: FromStr>(name: &str, flag: T) -> Result<T, String> {
  match env::var(name) {
    Ok(raw) => raw
      .parse()
      .map_err(|_| format!("{name}: cannot parse {raw:?}")),
    Err(_) => Ok(flag),
  }
}

fn load_org(path: &Path) -> Result<Arc<MemoryOrganization>, String> {
  MemoryOrganization::load(path)
    .map(Arc::new)
    .map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

async fn report(
  org: PathBuf,
  workers: usize,
  rate: f64,
  burst: f64,
  queue_capacity: Option<usize>,
  active_only: bool,
) -> Result<(), String> {
  let workers = env_override("ORG_CONTACTS_WORKERS", workers)?;
  let rate = env_override("ORG_CONTACTS_RATE", rate)?;
  let burst = env_override("ORG_CONTACTS_BURST", burst)?;
  info!(workers, rate, burst, ?queue_capacity, "options (env or flags)");

  let org = load_org(&org)?;
  let limiter = Arc::new(RateLimiter::new(rate, burst).map_err(|e| e.to_string())?);
  let resolver = Arc::new(ContactResolver::new(org.clone(), limiter));
  let mut lister = AccountLister::new(org);
  if active_only {
    lister = lister.active_only();
  }

  let mut config = PipelineConfig::with_workers(workers);
  if let Some(capacity) = queue_capacity {
    config = config.bounded(capacity);
  }
  let pipeline = Pipeline::new(config).map_err(|e| e.to_string())?;
  let summary = pipeline
    .run(lister, resolver, JsonLinesReporter::stdout())
    .await
    .map_err(|e| format!("Pipeline error: {e}"))?;

  eprintln!("Pipeline completed.");
  eprintln!("  Accounts: {}", summary.payloads);
  eprintln!("  Contacts: {}", summary.successes());
  eprintln!("  Errors: {}", summary.failures());
  Ok(())
}

async fn update(org: PathBuf, owners: PathBuf, tag_key: Option<String>) -> Result<(), String> {
  let org = load_org(&org)?;
  let owners = load_owner_map(&owners).map_err(|e| e.to_string())?;
  println!(
    "Will update alternate contacts for {} accounts.",
    owners.len()
  );

  let updater = ContactUpdater::new(org.clone(), org);
  let options = UpdateOptions { tag_key };
  let summary = updater
    .update_all(&owners, &options, |event| match event {
      UpdateEvent::Started {
        index,
        account_id,
        owner,
      } => println!("{index:03}: Set alternate contacts for {account_id} to {owner}."),
      UpdateEvent::Finished { .. } => {}
      UpdateEvent::Failed {
        index,
        account_id,
        error,
        ..
      } => println!("{index:03}: Error for account {account_id}: {error}"),
    })
    .await
    .map_err(|e| format!("Update error: {e}"))?;

  info!(updated = summary.updated, failed = summary.failed, "update completed");
  Ok(())
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  info!("org_contacts starting");
  let args = Args::parse();

  let result = match args.command {
    Command::Report {
      org,
      workers,
      rate,
      burst,
      queue_capacity,
      active_only,
    } => report(org, workers, rate, burst, queue_capacity, active_only).await,
    Command::Update {
      org,
      owners,
      tag_key,
    } => update(org, owners, tag_key).await,
  };

  if let Err(e) = result {
    eprintln!("{e}");
    process::exit(1);
  }
}
