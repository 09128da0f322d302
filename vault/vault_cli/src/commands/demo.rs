//! Allocate boxes to named customers.
//!
//! Customers are served in the order given and keep their boxes until
//! everyone has been served, so once the pool is exhausted later
//! customers wait up to `--wait-ms` and then go without.

use anyhow::{anyhow, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use vault_concurrency::pool::LoggingObserver;
use vault_concurrency::{CancellationToken, ResourcePool};
use vault_core::{PoolError, ResourceId, VaultConfig};

/// Arguments for the demo command
#[derive(Args)]
pub struct DemoArgs {
    /// Customer to allocate a box to; repeat for several customers
    #[clap(long = "customer", required = true)]
    pub customers: Vec<String>,

    /// How long each customer waits for a box, in milliseconds
    #[clap(long, default_value_t = 50)]
    pub wait_ms: u64,
}

/// Implementation of the demo command
pub fn execute(args: &DemoArgs, config: &VaultConfig) -> Result<()> {
    if args.customers.iter().any(|c| c.trim().is_empty()) {
        return Err(anyhow!("customer names must not be empty"));
    }

    let observer = Arc::new(LoggingObserver::new(config.pool.name.clone()));
    let pool = ResourcePool::<str>::with_observer(config.pool.clone(), observer);
    let wait = Duration::from_millis(args.wait_ms);

    let mut allocations: Vec<(&str, ResourceId)> = Vec::new();

    for customer in &args.customers {
        let token = CancellationToken::with_timeout(wait);
        match pool.acquire_for_with(customer.as_str(), &token) {
            Ok(resource) => {
                println!("Allocated {} to {}", resource, customer);
                allocations.push((customer.as_str(), resource));
            }
            Err(err @ PoolError::ObserverFailure { .. }) => {
                // The box is held even though the notification failed.
                if let Some(resource) = err.resource() {
                    println!("Allocated {} to {} ({})", resource, customer, err);
                    allocations.push((customer.as_str(), resource));
                }
            }
            Err(err) => println!("No box for {}: {}", customer, err),
        }
    }

    for (customer, resource) in allocations {
        match pool.release_for(resource, customer) {
            Ok(()) => println!("Released {} from {}", resource, customer),
            Err(err) => println!("Released {} from {} ({})", resource, customer, err),
        }
    }

    println!();
    super::print_snapshot(&pool.snapshot());
    Ok(())
}
