//! Inspect the configured pool.

use anyhow::Result;
use clap::Args;
use vault_concurrency::ResourcePool;
use vault_core::VaultConfig;

/// Arguments for the status command
#[derive(Args)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[clap(long)]
    pub json: bool,
}

/// Implementation of the status command
pub fn execute(args: &StatusArgs, config: &VaultConfig) -> Result<()> {
    let pool: ResourcePool = ResourcePool::new(config.pool.clone());
    let snapshot = pool.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        super::print_snapshot(&snapshot);
    }
    Ok(())
}
