//! Integration tests for the resource pool.
//!
//! These tests drive a pool from several threads and check the
//! externally visible guarantees: mutual exclusion, the capacity bound,
//! blocking and waking, and the sticky contention flag.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use vault_concurrency::pool::RecordingObserver;
use vault_concurrency::{CancellationToken, ResourcePool};
use vault_core::{CancelReason, PoolConfig, PoolError, PoolEvent, ResourceId};

fn wait_for_waiters<C: ?Sized>(pool: &ResourcePool<C>, count: usize) {
    let start = Instant::now();
    while pool.waiting_count() < count {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timed out waiting for blocked acquirers"
        );
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn two_holders_at_capacity_two_never_wait() {
    let pool: ResourcePool = ResourcePool::for_testing(2);
    let both_holding = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            let both_holding = Arc::clone(&both_holding);
            thread::spawn(move || {
                let id = pool.acquire().unwrap();
                both_holding.wait();
                thread::sleep(Duration::from_millis(20));
                pool.release(id);
                id
            })
        })
        .collect();

    let ids: HashSet<ResourceId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(ids.len(), 2);
    assert!(!pool.contention_occurred());
    assert_eq!(pool.available_count(), 2);
}

#[test]
fn third_acquirer_blocks_until_a_release() {
    let pool: ResourcePool = ResourcePool::for_testing(2);
    let (acquired_tx, acquired_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(Mutex::new(release_rx));

    let holders: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            let acquired_tx = acquired_tx.clone();
            let release_rx = Arc::clone(&release_rx);
            thread::spawn(move || {
                let id = pool.acquire().unwrap();
                acquired_tx.send(id).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
                pool.release(id);
            })
        })
        .collect();

    acquired_rx.recv().unwrap();
    acquired_rx.recv().unwrap();
    assert!(!pool.contention_occurred());

    let third = {
        let pool = pool.clone();
        thread::spawn(move || {
            let id = pool.acquire().unwrap();
            pool.release(id);
            id
        })
    };

    wait_for_waiters(&pool, 1);
    assert!(pool.contention_occurred());
    assert_eq!(pool.held_count(), 2);

    release_tx.send(()).unwrap();
    let id = third.join().unwrap();
    assert!(id == ResourceId::new(1) || id == ResourceId::new(2));

    release_tx.send(()).unwrap();
    for holder in holders {
        holder.join().unwrap();
    }

    // The flag is sticky until reset
    assert_eq!(pool.available_count(), 2);
    assert_eq!(pool.total_count(), 2);
    assert!(pool.contention_occurred());

    pool.reset();
    assert!(!pool.contention_occurred());
}

#[test]
fn three_threads_hold_and_release_under_contention() {
    let pool: ResourcePool = ResourcePool::for_testing(2);
    let start = Arc::new(Barrier::new(3));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let pool = pool.clone();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let id = pool.acquire().unwrap();
                thread::sleep(Duration::from_millis(200));
                pool.release(id);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.available_count(), 2);
    assert_eq!(pool.total_count(), 2);
    assert!(pool.contention_occurred());
}

#[test]
fn zero_capacity_never_blocks() {
    let pool: ResourcePool = ResourcePool::for_testing(0);
    let started = Instant::now();

    let err = pool.acquire().unwrap_err();

    assert!(matches!(err, PoolError::NoResourceAvailable { capacity: 0 }));
    assert!(!err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!pool.contention_occurred());
}

#[test]
fn held_resources_never_exceed_capacity() {
    const CAPACITY: i64 = 3;
    const THREADS: usize = 8;
    const ROUNDS: usize = 50;

    let pool: ResourcePool = ResourcePool::for_testing(CAPACITY);
    let holders = Arc::new(Mutex::new(HashSet::new()));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = pool.clone();
            let holders = Arc::clone(&holders);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let id = pool.acquire().unwrap();
                    {
                        let mut holders = holders.lock().unwrap();
                        assert!(holders.insert(id), "{} handed out twice", id);
                        peak.fetch_max(holders.len(), Ordering::SeqCst);
                    }
                    thread::yield_now();
                    holders.lock().unwrap().remove(&id);
                    pool.release(id);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= CAPACITY as usize);
    assert!(pool.total_count() <= CAPACITY as usize);
    assert_eq!(pool.held_count(), 0);
    assert_eq!(pool.waiting_count(), 0);
}

#[test]
fn release_wakes_every_waiter_but_only_one_wins() {
    let pool: ResourcePool = ResourcePool::for_testing(1);
    let first = pool.acquire().unwrap();
    let token = CancellationToken::new();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let pool = pool.clone();
            let token = token.clone();
            thread::spawn(move || pool.acquire_with(&token))
        })
        .collect();

    wait_for_waiters(&pool, 3);
    pool.release(first);

    // Exactly one waiter takes the freed resource; the others keep waiting
    let start = Instant::now();
    while pool.waiting_count() != 2 {
        assert!(start.elapsed() < Duration::from_secs(5));
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(pool.held_count(), 1);

    token.cancel();

    let results: Vec<_> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let cancelled = results
        .iter()
        .filter(|r| matches!(r, Err(PoolError::WaitCancelled(CancelReason::Cancelled))))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(cancelled, 2);
    assert_eq!(pool.held_count(), 1);
    assert_eq!(pool.waiting_count(), 0);
}

#[test]
fn observer_is_told_about_each_holder() {
    let observer = Arc::new(RecordingObserver::new());
    let pool = ResourcePool::<str>::with_observer(PoolConfig::with_capacity(1), observer.clone());

    let alice = pool.acquire_for("alice").unwrap();
    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            let id = pool.acquire_for("bob").unwrap();
            pool.release_for(id, "bob").unwrap();
        })
    };

    wait_for_waiters(&pool, 1);
    pool.release_for(alice, "alice").unwrap();
    waiter.join().unwrap();

    // Notifications run outside the pool lock, so only alice's acquire
    // is guaranteed to be reported first.
    let events: Vec<_> = observer
        .events()
        .into_iter()
        .map(|e| (e.event, e.context))
        .collect();

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], (PoolEvent::Acquired, "alice".to_string()));
    assert!(events.contains(&(PoolEvent::Released, "bob".to_string())));
    assert!(events.contains(&(PoolEvent::Released, "alice".to_string())));
    assert!(events.contains(&(PoolEvent::Acquired, "bob".to_string())));
}
