//! Observers notified when resources change hands.
//!
//! An observer is how the surrounding system reacts to allocation, for
//! example by telling a customer their box is ready. The pool calls it
//! after its own state has changed and outside of the pool lock, so a
//! failing or slow observer never affects who holds what.

use log::{info, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use vault_core::{ObserverError, PoolEvent, ResourceId};

/// Receives acquire and release notifications from a pool.
///
/// `C` is the context supplied by the caller, such as the customer on
/// whose behalf a box is acquired.
pub trait PoolObserver<C: ?Sized>: Send + Sync {
    /// Called after `resource` has been marked held.
    fn on_acquired(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError>;

    /// Called after `resource` has been marked free.
    fn on_released(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError>;
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl<C: ?Sized> PoolObserver<C> for NoopObserver {
    fn on_acquired(&self, _resource: ResourceId, _context: &C) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_released(&self, _resource: ResourceId, _context: &C) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that writes each notification to the log.
///
/// A blank context has nobody to announce to and is rejected.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    pool_name: String,
}

impl LoggingObserver {
    /// Create an observer that tags its records with `pool_name`.
    pub fn new(pool_name: impl Into<String>) -> Self {
        Self {
            pool_name: pool_name.into(),
        }
    }

    fn recipient<C: fmt::Display + ?Sized>(&self, context: &C) -> Result<String, ObserverError> {
        let recipient = context.to_string();
        if recipient.trim().is_empty() {
            return Err(ObserverError::Rejected(format!(
                "no recipient for {} notification",
                self.pool_name
            )));
        }
        Ok(recipient)
    }
}

impl<C: fmt::Display + ?Sized> PoolObserver<C> for LoggingObserver {
    fn on_acquired(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError> {
        let recipient = self.recipient(context)?;
        info!("[{}] {} allocated to {}", self.pool_name, resource, recipient);
        Ok(())
    }

    fn on_released(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError> {
        let recipient = self.recipient(context)?;
        info!("[{}] {} released by {}", self.pool_name, resource, recipient);
        Ok(())
    }
}

/// A notification captured by `RecordingObserver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// What happened
    pub event: PoolEvent,

    /// Which resource it happened to
    pub resource: ResourceId,

    /// The caller's context, rendered with `Display`
    pub context: String,
}

/// Observer that keeps every notification in memory.
///
/// It can be told to fail so callers can exercise their handling of
/// advisory observer errors.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
    failure: Mutex<Option<ObserverError>>,
}

impl RecordingObserver {
    /// Create an observer that records and succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an observer that records and then fails with `error`.
    pub fn failing(error: ObserverError) -> Self {
        let observer = Self::default();
        observer.fail_with(Some(error));
        observer
    }

    /// Change whether subsequent notifications fail.
    pub fn fail_with(&self, error: Option<ObserverError>) {
        *self.failure.lock() = error;
    }

    /// Notifications seen so far, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Forget every recorded notification.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: PoolEvent, resource: ResourceId, context: String) -> Result<(), ObserverError> {
        self.events.lock().push(RecordedEvent {
            event,
            resource,
            context,
        });

        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<C: fmt::Display + ?Sized> PoolObserver<C> for RecordingObserver {
    fn on_acquired(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError> {
        self.record(PoolEvent::Acquired, resource, context.to_string())
    }

    fn on_released(&self, resource: ResourceId, context: &C) -> Result<(), ObserverError> {
        self.record(PoolEvent::Released, resource, context.to_string())
    }
}

/// Deliver one notification, turning a panic into `ObserverError::Panicked`.
pub(crate) fn notify<C: ?Sized>(
    observer: &dyn PoolObserver<C>,
    event: PoolEvent,
    resource: ResourceId,
    context: &C,
) -> Result<(), ObserverError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event {
        PoolEvent::Acquired => observer.on_acquired(resource, context),
        PoolEvent::Released => observer.on_released(resource, context),
    }));

    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(ObserverError::Panicked(panic_message(payload.as_ref()))),
    };

    if let Err(ref error) = result {
        warn!("Observer failed on {} of {}: {}", event, resource, error);
    }

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingObserver;

    impl PoolObserver<str> for PanickingObserver {
        fn on_acquired(&self, _resource: ResourceId, _context: &str) -> Result<(), ObserverError> {
            panic!("mail relay exploded");
        }

        fn on_released(&self, resource: ResourceId, _context: &str) -> Result<(), ObserverError> {
            panic!("{} could not be announced", resource);
        }
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        let id = ResourceId::new(1);

        notify::<str>(&observer, PoolEvent::Acquired, id, "alice").unwrap();
        notify::<str>(&observer, PoolEvent::Released, id, "alice").unwrap();

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, PoolEvent::Acquired);
        assert_eq!(events[1].event, PoolEvent::Released);
        assert_eq!(events[1].context, "alice");
    }

    #[test]
    fn test_failing_observer_still_records() {
        let observer = RecordingObserver::failing(ObserverError::Delivery("offline".into()));

        let result = notify::<str>(&observer, PoolEvent::Acquired, ResourceId::FIRST, "bob");
        assert_eq!(result, Err(ObserverError::Delivery("offline".into())));
        assert_eq!(observer.events().len(), 1);

        observer.fail_with(None);
        assert!(notify::<str>(&observer, PoolEvent::Released, ResourceId::FIRST, "bob").is_ok());
    }

    #[test]
    fn test_panics_become_observer_errors() {
        let acquired = notify::<str>(&PanickingObserver, PoolEvent::Acquired, ResourceId::FIRST, "x");
        assert_eq!(
            acquired,
            Err(ObserverError::Panicked("mail relay exploded".into()))
        );

        let released = notify::<str>(&PanickingObserver, PoolEvent::Released, ResourceId::new(2), "x");
        assert_eq!(
            released,
            Err(ObserverError::Panicked("box-2 could not be announced".into()))
        );
    }

    #[test]
    fn test_noop_and_logging_observers_succeed() {
        let logging = LoggingObserver::new("test-pool");
        assert!(notify::<str>(&logging, PoolEvent::Acquired, ResourceId::FIRST, "carol").is_ok());
        assert!(notify::<u32>(&NoopObserver, PoolEvent::Released, ResourceId::FIRST, &7).is_ok());
    }

    #[test]
    fn test_logging_observer_rejects_blank_recipient() {
        let logging = LoggingObserver::new("test-pool");
        let result = notify::<str>(&logging, PoolEvent::Acquired, ResourceId::FIRST, "  ");

        assert_eq!(
            result,
            Err(ObserverError::Rejected(
                "no recipient for test-pool notification".into()
            ))
        );
    }
}
