//! Subcommand implementations.

pub mod demo;
pub mod scenario;
pub mod status;

use vault_concurrency::PoolSnapshot;

/// Print a snapshot as human readable lines.
pub fn print_snapshot(snapshot: &PoolSnapshot) {
    println!("Pool:        {}", snapshot.name);
    println!("Capacity:    {}", snapshot.capacity);
    println!("Created:     {}", snapshot.created);
    println!("Held:        {}", snapshot.held);
    println!("Available:   {}", snapshot.available);
    println!("Waiting:     {}", snapshot.waiting);
    println!("Contention:  {}", snapshot.contention);
}
