//! Scoped ownership of a pooled resource.

use crate::pool::resource::ResourcePool;
use log::trace;
use std::time::{Duration, Instant};
use vault_core::ResourceId;

/// A held resource that goes back to its pool when dropped.
pub struct Lease<'a, C: ?Sized = ()> {
    /// Pool the resource belongs to
    pool: &'a ResourcePool<C>,

    /// The held resource
    resource: ResourceId,

    /// Set once the resource has gone back or been taken over
    returned: bool,

    /// When this resource was acquired
    acquired_at: Instant,
}

impl<'a, C: ?Sized> Lease<'a, C> {
    pub(crate) fn new(pool: &'a ResourcePool<C>, resource: ResourceId) -> Self {
        Self {
            pool,
            resource,
            returned: false,
            acquired_at: Instant::now(),
        }
    }

    /// The leased resource.
    pub fn id(&self) -> ResourceId {
        self.resource
    }

    /// Time since the resource was acquired.
    pub fn held_duration(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Return the resource now instead of at the end of the scope.
    pub fn release(mut self) {
        self.return_to_pool();
    }

    /// Keep the resource past the lease and take over releasing it.
    pub fn into_inner(mut self) -> ResourceId {
        self.returned = true;
        self.resource
    }

    fn return_to_pool(&mut self) {
        if self.returned {
            return;
        }
        self.returned = true;
        trace!(
            "Lease on {} ended after {:?}",
            self.resource,
            self.acquired_at.elapsed()
        );
        self.pool.release(self.resource);
    }
}

impl<C: ?Sized> Drop for Lease<'_, C> {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}

impl<C: ?Sized> std::fmt::Debug for Lease<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("resource", &self.resource)
            .field("held_for", &self.held_duration())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_releases_on_drop() {
        let pool: ResourcePool = ResourcePool::for_testing(1);

        {
            let lease = pool.lease().unwrap();
            assert_eq!(lease.id(), ResourceId::FIRST);
            assert_eq!(pool.available_count(), 0);
        }

        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_explicit_release_and_into_inner() {
        let pool: ResourcePool = ResourcePool::for_testing(2);

        let lease = pool.lease().unwrap();
        lease.release();
        assert_eq!(pool.held_count(), 0);

        let kept = pool.lease().unwrap().into_inner();
        assert_eq!(pool.held_count(), 1);
        assert!(pool.release(kept));
    }
    #[test]
    fn test_lease_from_before_reset_does_not_free_new_holder() {
        let pool: ResourcePool = ResourcePool::for_testing(1);
        let stale = pool.lease().unwrap();

        pool.reset();
        let fresh = pool.lease().unwrap();
        assert_ne!(stale.id(), fresh.id());

        drop(stale);
        assert_eq!(pool.held_count(), 1);
        assert!(pool.try_acquire().is_err());

        drop(fresh);
        assert_eq!(pool.available_count(), 1);
    }
}
