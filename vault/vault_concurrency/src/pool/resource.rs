//! Bounded pool of interchangeable resources with blocking acquire.
//!
//! Resources are created lazily, numbered from one in creation order, and
//! never destroyed while the pool lives (except by `reset`); they only
//! move between held and free. Numbers are never reused, so an id handed
//! out before a reset cannot release a resource created after it. When every resource is held and no more may be created, an
//! acquire blocks on the pool's condition variable until a release (or a
//! capacity increase) wakes it. Every waiter is woken and re-checks, so
//! only one of them wins each freed resource.

use crate::pool::lease::Lease;
use crate::pool::observer::{notify, NoopObserver, PoolObserver};
use crate::sync::cancel::{CancellationToken, Wake};
use log::{debug, info, trace};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;
use vault_core::{log_event, PoolConfig, PoolError, PoolEvent, ResourceId};

/// Held state of one created resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    /// Identifier assigned at creation
    pub id: ResourceId,

    /// Whether some caller currently holds it
    pub held: bool,
}

/// Point-in-time view of a pool, suitable for status reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Pool name from its configuration
    pub name: String,

    /// Current capacity
    pub capacity: i64,

    /// Number of resources created so far
    pub created: usize,

    /// Number of resources currently held
    pub held: usize,

    /// Number of resources currently free
    pub available: usize,

    /// Number of callers blocked in acquire
    pub waiting: usize,

    /// Whether any acquire has ever had to block
    pub contention: bool,
}

/// State guarded by the pool lock.
#[derive(Debug)]
struct PoolState {
    /// Created resources in creation order
    resources: Vec<ResourceState>,

    /// Maximum number of resources to create
    capacity: i64,

    /// Sticky: set the first time an acquire blocks
    contention: bool,

    /// Callers currently blocked in acquire
    waiting: usize,

    /// Identifier for the next created resource; survives `reset`
    next_id: ResourceId,
}

impl PoolState {
    fn new(capacity: i64) -> Self {
        Self {
            resources: Vec::new(),
            capacity,
            contention: false,
            waiting: 0,
            next_id: ResourceId::FIRST,
        }
    }

    /// Take the first free resource, or create one if capacity allows.
    fn try_take(&mut self) -> Option<ResourceId> {
        if let Some(resource) = self.resources.iter_mut().find(|r| !r.held) {
            resource.held = true;
            trace!("Reusing free resource {}", resource.id);
            return Some(resource.id);
        }

        if (self.resources.len() as i64) < self.capacity {
            let id = self.next_id;
            self.next_id = id.next();
            self.resources.push(ResourceState { id, held: true });
            debug!(
                "Created resource {} ({} of {})",
                id,
                self.resources.len(),
                self.capacity
            );
            return Some(id);
        }

        None
    }

    /// A non-positive capacity rejects instead of blocking.
    fn rejects_waiters(&self) -> bool {
        self.capacity <= 0
    }

    fn held_count(&self) -> usize {
        self.resources.iter().filter(|r| r.held).count()
    }

    fn available_count(&self) -> usize {
        self.resources.len() - self.held_count()
    }
}

/// Lock and condition shared by every handle to one pool.
struct Shared {
    state: Mutex<PoolState>,
    available: Condvar,
}

impl Wake for Shared {
    fn wake(&self) {
        // Taking the lock orders this wakeup after any waiter that has
        // checked its token but not yet started waiting.
        let _state = self.state.lock();
        self.available.notify_all();
    }
}

/// A bounded pool of resources shared between threads.
///
/// Cloning a `ResourcePool` yields another handle to the same pool. `C` is
/// the context type passed to the observer by `acquire_for` and
/// `release_for`.
///
/// ```
/// use vault_concurrency::ResourcePool;
/// use vault_core::ResourceId;
///
/// let pool: ResourcePool = ResourcePool::for_testing(2);
///
/// let first = pool.acquire().unwrap();
/// let second = pool.acquire().unwrap();
/// assert_eq!((first, second), (ResourceId::new(1), ResourceId::new(2)));
/// assert_eq!(pool.available_count(), 0);
///
/// pool.release(first);
/// assert_eq!(pool.available_count(), 1);
/// assert!(!pool.contention_occurred());
/// ```
pub struct ResourcePool<C: ?Sized = ()> {
    shared: Arc<Shared>,
    observer: Arc<dyn PoolObserver<C>>,
    config: Arc<PoolConfig>,
}

impl<C: ?Sized> Clone for ResourcePool<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            observer: Arc::clone(&self.observer),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: ?Sized> ResourcePool<C> {
    /// Create a pool that notifies nobody.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    /// Create a pool that reports acquire/release with context to `observer`.
    pub fn with_observer(config: PoolConfig, observer: Arc<dyn PoolObserver<C>>) -> Self {
        log_event!(vault_core::utils::LogLevel::Info, "Creating resource pool",
            pool => config.name,
            capacity => config.capacity,
        );

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState::new(config.capacity)),
                available: Condvar::new(),
            }),
            observer,
            config: Arc::new(config),
        }
    }

    /// Create a fresh, isolated pool with the given capacity.
    ///
    /// Intended for tests and tooling that must not share state with any
    /// other pool.
    pub fn for_testing(capacity: i64) -> Self {
        Self::new(PoolConfig {
            name: "test-pool".to_string(),
            capacity,
        })
    }

    /// The configuration this pool was created with.
    ///
    /// The live capacity may differ; see [`ResourcePool::capacity`].
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Acquire a resource, blocking while none is free.
    ///
    /// Waits until a resource is released; use `acquire_with` for a
    /// bounded wait. Returns `NoResourceAvailable` instead of blocking if
    /// nothing is free and the capacity is not positive.
    pub fn acquire(&self) -> Result<ResourceId, PoolError> {
        self.acquire_inner(None)
    }

    /// Acquire a resource, giving up when `token` is cancelled or expires.
    pub fn acquire_with(&self, token: &CancellationToken) -> Result<ResourceId, PoolError> {
        self.acquire_inner(Some(token))
    }

    /// Acquire a resource only if one is free or can be created now.
    ///
    /// Never blocks and never marks the pool as contended.
    pub fn try_acquire(&self) -> Result<ResourceId, PoolError> {
        let mut state = self.shared.state.lock();
        state.try_take().ok_or(PoolError::NoResourceAvailable {
            capacity: state.capacity,
        })
    }

    /// Acquire a resource on behalf of `context` and notify the observer.
    ///
    /// If the observer fails the resource is still held by the caller and
    /// the error carries its id.
    pub fn acquire_for(&self, context: &C) -> Result<ResourceId, PoolError> {
        let resource = self.acquire_inner(None)?;
        self.report(PoolEvent::Acquired, resource, context)?;
        Ok(resource)
    }

    /// `acquire_for` bounded by `token`.
    pub fn acquire_for_with(
        &self,
        context: &C,
        token: &CancellationToken,
    ) -> Result<ResourceId, PoolError> {
        let resource = self.acquire_inner(Some(token))?;
        self.report(PoolEvent::Acquired, resource, context)?;
        Ok(resource)
    }

    /// Acquire a resource wrapped in a guard that releases it on drop.
    pub fn lease(&self) -> Result<Lease<'_, C>, PoolError> {
        self.acquire().map(|resource| Lease::new(self, resource))
    }

    /// `lease` bounded by `token`.
    pub fn lease_with(&self, token: &CancellationToken) -> Result<Lease<'_, C>, PoolError> {
        self.acquire_with(token)
            .map(|resource| Lease::new(self, resource))
    }

    /// Return a resource to the pool and wake blocked acquirers.
    ///
    /// Releasing an unknown or already free resource does nothing.
    /// Returns whether the resource was held.
    pub fn release(&self, resource: ResourceId) -> bool {
        let mut state = self.shared.state.lock();

        let Some(slot) = state
            .resources
            .iter_mut()
            .find(|r| r.id == resource && r.held)
        else {
            trace!("Ignoring release of {} which is not held", resource);
            return false;
        };

        slot.held = false;
        debug!(
            "Released {} in '{}' ({} waiting)",
            resource, self.config.name, state.waiting
        );
        self.shared.available.notify_all();
        true
    }

    /// Return a resource on behalf of `context` and notify the observer.
    ///
    /// The observer is only told about releases that freed a held
    /// resource. An observer failure does not undo the release.
    pub fn release_for(&self, resource: ResourceId, context: &C) -> Result<(), PoolError> {
        if self.release(resource) {
            self.report(PoolEvent::Released, resource, context)?;
        }
        Ok(())
    }

    /// Maximum number of resources the pool will create.
    pub fn capacity(&self) -> i64 {
        self.shared.state.lock().capacity
    }

    /// Change the capacity.
    ///
    /// Lowering it below the number of created resources keeps them all;
    /// it only stops further creation. Raising it wakes blocked acquirers
    /// so they can create the new resources.
    pub fn set_capacity(&self, capacity: i64) {
        let mut state = self.shared.state.lock();
        debug!(
            "Capacity of '{}' changed from {} to {}",
            self.config.name, state.capacity, capacity
        );
        state.capacity = capacity;
        self.shared.available.notify_all();
    }

    /// Number of created resources that are not held.
    pub fn available_count(&self) -> usize {
        self.shared.state.lock().available_count()
    }

    /// Number of resources currently held.
    pub fn held_count(&self) -> usize {
        self.shared.state.lock().held_count()
    }

    /// Number of resources created so far.
    pub fn total_count(&self) -> usize {
        self.shared.state.lock().resources.len()
    }

    /// Number of callers currently blocked in acquire.
    pub fn waiting_count(&self) -> usize {
        self.shared.state.lock().waiting
    }

    /// Whether any acquire has had to block since creation or the last reset.
    pub fn contention_occurred(&self) -> bool {
        self.shared.state.lock().contention
    }

    /// Created resources and their held state, in creation order.
    pub fn resources(&self) -> Vec<ResourceState> {
        self.shared.state.lock().resources.clone()
    }

    /// Consistent view of the pool's counters.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.shared.state.lock();
        PoolSnapshot {
            name: self.config.name.clone(),
            capacity: state.capacity,
            created: state.resources.len(),
            held: state.held_count(),
            available: state.available_count(),
            waiting: state.waiting,
            contention: state.contention,
        }
    }

    /// Drop every resource and clear the contention flag.
    ///
    /// Meant for test isolation and operator tooling. Ids handed out before
    /// the reset become unknown, so releasing them (or dropping their
    /// leases) does nothing; numbering continues where it left off.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        info!(
            "Resetting pool '{}' ({} resources dropped)",
            self.config.name,
            state.resources.len()
        );
        state.resources.clear();
        state.contention = false;
        self.shared.available.notify_all();
    }

    /// `reset` and then set the capacity.
    pub fn reset_with_capacity(&self, capacity: i64) {
        let mut state = self.shared.state.lock();
        info!(
            "Resetting pool '{}' with capacity {}",
            self.config.name, capacity
        );
        state.resources.clear();
        state.contention = false;
        state.capacity = capacity;
        self.shared.available.notify_all();
    }

    fn report(&self, event: PoolEvent, resource: ResourceId, context: &C) -> Result<(), PoolError> {
        notify(self.observer.as_ref(), event, resource, context).map_err(|source| {
            PoolError::ObserverFailure {
                resource,
                event,
                source,
            }
        })
    }

    fn acquire_inner(&self, token: Option<&CancellationToken>) -> Result<ResourceId, PoolError> {
        let mut state = self.shared.state.lock();

        if let Some(resource) = state.try_take() {
            return Ok(resource);
        }

        if state.rejects_waiters() {
            debug!(
                "Rejecting acquire on '{}': capacity {}",
                self.config.name, state.capacity
            );
            return Err(PoolError::NoResourceAvailable {
                capacity: state.capacity,
            });
        }

        if let Some(token) = token {
            token.check().map_err(PoolError::WaitCancelled)?;
        }

        if !state.contention {
            log_event!(vault_core::utils::LogLevel::Info, "Pool exhausted, acquirers now waiting",
                pool => self.config.name,
                capacity => state.capacity,
            );
        }
        state.contention = true;
        state.waiting += 1;

        let waker: Arc<dyn Wake> = self.shared.clone();
        let _registration = token.map(|token| token.register(Arc::downgrade(&waker)));
        let deadline = token.and_then(CancellationToken::deadline);

        let outcome = loop {
            match deadline {
                Some(deadline) => {
                    self.shared.available.wait_until(&mut state, deadline);
                }
                None => self.shared.available.wait(&mut state),
            }

            if let Some(reason) = token.and_then(|token| token.check().err()) {
                debug!("Wait on '{}' ended: {}", self.config.name, reason);
                break Err(PoolError::WaitCancelled(reason));
            }

            if let Some(resource) = state.try_take() {
                break Ok(resource);
            }

            if state.rejects_waiters() {
                break Err(PoolError::NoResourceAvailable {
                    capacity: state.capacity,
                });
            }
        };

        state.waiting -= 1;
        outcome
    }
}
