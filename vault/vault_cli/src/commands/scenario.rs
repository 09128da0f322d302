//! Contention scenario: many holders, few boxes.
//!
//! Every thread starts at the same moment, acquires a box for itself,
//! holds it for a while and hands it back. With more threads than boxes
//! some of them have to wait, which shows up as contention in the final
//! snapshot.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::info;
use serde::Serialize;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use vault_concurrency::pool::LoggingObserver;
use vault_concurrency::{PoolSnapshot, ResourcePool};
use vault_core::{PoolError, ResourceId, VaultConfig};

/// Arguments for the scenario command
#[derive(Args)]
pub struct ScenarioArgs {
    /// Number of concurrent holders
    #[clap(long, default_value_t = 3)]
    pub threads: usize,

    /// Pool capacity; defaults to the configured capacity
    #[clap(long, allow_hyphen_values = true)]
    pub capacity: Option<i64>,

    /// How long each holder keeps its box, in milliseconds
    #[clap(long, default_value_t = 100)]
    pub hold_ms: u64,

    /// Print the report as JSON
    #[clap(long)]
    pub json: bool,
}

/// What happened to one holder.
#[derive(Debug, Serialize)]
pub struct HolderOutcome {
    /// Name the holder acquired under
    pub holder: String,

    /// Box the holder got, if any
    pub resource: Option<ResourceId>,

    /// How long the holder waited for its box, in milliseconds
    pub waited_ms: u128,

    /// Why the holder got nothing, or why its observer complained
    pub error: Option<String>,
}

/// Outcome of a whole scenario run.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    /// Per-holder results in thread order
    pub holders: Vec<HolderOutcome>,

    /// Pool state after every holder finished
    pub pool: PoolSnapshot,
}

fn run_holder(pool: &ResourcePool<str>, holder: &str, hold: Duration) -> HolderOutcome {
    let started = Instant::now();
    let acquired = pool.acquire_for(holder);
    let waited_ms = started.elapsed().as_millis();

    let (resource, mut error) = match acquired {
        Ok(resource) => (Some(resource), None),
        Err(err @ PoolError::ObserverFailure { .. }) => (err.resource(), Some(err.to_string())),
        Err(err) => (None, Some(err.to_string())),
    };

    if let Some(resource) = resource {
        thread::sleep(hold);
        if let Err(err) = pool.release_for(resource, holder) {
            error.get_or_insert_with(|| err.to_string());
        }
    }

    HolderOutcome {
        holder: holder.to_string(),
        resource,
        waited_ms,
        error,
    }
}

/// Run the scenario and collect its report.
pub fn run(args: &ScenarioArgs, config: &VaultConfig) -> Result<ScenarioReport> {
    let mut pool_config = config.pool.clone();
    if let Some(capacity) = args.capacity {
        pool_config.capacity = capacity;
    }

    let observer = Arc::new(LoggingObserver::new(pool_config.name.clone()));
    let pool = ResourcePool::<str>::with_observer(pool_config, observer);
    let hold = Duration::from_millis(args.hold_ms);
    let start = Arc::new(Barrier::new(args.threads));

    info!(
        "Running scenario: {} holders, capacity {}, hold {:?}",
        args.threads,
        pool.capacity(),
        hold
    );

    let handles = (1..=args.threads)
        .map(|n| {
            let pool = pool.clone();
            let start = Arc::clone(&start);
            thread::Builder::new()
                .name(format!("holder-{}", n))
                .spawn(move || {
                    start.wait();
                    run_holder(&pool, &format!("holder-{}", n), hold)
                })
                .context("failed to spawn holder thread")
        })
        .collect::<Result<Vec<_>>>()?;

    let holders = handles
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("holder thread panicked"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ScenarioReport {
        holders,
        pool: pool.snapshot(),
    })
}

/// Implementation of the scenario command
pub fn execute(args: &ScenarioArgs, config: &VaultConfig) -> Result<()> {
    if args.threads == 0 {
        return Err(anyhow!("--threads must be at least 1"));
    }

    let report = run(args, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for outcome in &report.holders {
        match (&outcome.resource, &outcome.error) {
            (Some(resource), None) => println!(
                "{} got {} after {}ms",
                outcome.holder, resource, outcome.waited_ms
            ),
            (Some(resource), Some(error)) => println!(
                "{} got {} after {}ms ({})",
                outcome.holder, resource, outcome.waited_ms, error
            ),
            (None, error) => println!(
                "{} got nothing: {}",
                outcome.holder,
                error.as_deref().unwrap_or("unknown")
            ),
        }
    }
    println!();
    super::print_snapshot(&report.pool);
    Ok(())
}
