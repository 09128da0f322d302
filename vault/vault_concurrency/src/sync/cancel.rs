//! Cancellation tokens for bounding blocking waits.
//!
//! A token is handed to a blocking acquire. Cancelling it, or letting its
//! deadline pass, ends the wait with `CancelReason`. Clones share state, so
//! one thread can block on a token while another cancels it.

use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use vault_core::CancelReason;

/// Something blocked on a token that must be woken when it is cancelled.
///
/// Implementations must serialize the wakeup with their own wait
/// condition so that a cancel racing with the start of a wait is not lost.
pub(crate) trait Wake: Send + Sync {
    /// Wake every waiter so it re-checks its token.
    fn wake(&self);
}

struct TokenInner {
    /// Set once by `cancel`
    cancelled: AtomicBool,

    /// Point in time after which waits give up
    deadline: Option<Instant>,

    /// Waiters currently blocked on this token, keyed by registration
    waiters: Mutex<Vec<(u64, Weak<dyn Wake>)>>,

    /// Key for the next registration
    next_key: AtomicU64,
}

/// A shareable handle that ends blocking waits early.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    /// Create a token that only ends a wait when cancelled.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a token whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(Instant::now() + timeout))
    }

    /// Create a token with an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                deadline,
                waiters: Mutex::new(Vec::new()),
                next_key: AtomicU64::new(0),
            }),
        }
    }

    /// Cancel the token and wake anything blocked on it.
    ///
    /// Cancelling twice has no further effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Collect first so the registry lock is not held while waking.
        let waiters: Vec<Arc<dyn Wake>> = self
            .inner
            .waiters
            .lock()
            .iter()
            .filter_map(|(_, waiter)| waiter.upgrade())
            .collect();

        debug!("Cancellation token fired, waking {} waiter(s)", waiters.len());

        for waiter in waiters {
            waiter.wake();
        }
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// The deadline, if this token has one.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Report why a wait on this token should stop, if it should.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.is_cancelled() {
            Err(CancelReason::Cancelled)
        } else if self.is_expired() {
            Err(CancelReason::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Register a waiter to be woken on cancellation.
    ///
    /// The registration is removed when the returned guard is dropped.
    pub(crate) fn register(&self, waiter: Weak<dyn Wake>) -> Registration<'_> {
        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        self.inner.waiters.lock().push((key, waiter));
        trace!("Registered waiter {} on cancellation token", key);
        Registration { token: self, key }
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.waiters.lock().len()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

/// Keeps a waiter registered on a token for as long as it lives.
pub(crate) struct Registration<'a> {
    token: &'a CancellationToken,
    key: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .waiters
            .lock()
            .retain(|(key, _)| *key != self.key);
    }
}
