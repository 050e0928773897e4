// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

#[test]
fn same_key_shares_one_mutex() {
    let locks = KeyedLocks::new();
    let a = locks.handle(&"alice");
    let b = locks.handle(&"alice");
    let c = locks.handle(&"bob");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(locks.len(), 2);
}

#[test]
fn holders_of_same_key_are_serialized() {
    let locks = Arc::new(KeyedLocks::new());
    let inside = Arc::new(AtomicU32::new(0));
    let max_inside = Arc::new(AtomicU32::new(0));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                let handle = locks.handle(&"alice");
                let _guard = handle.lock().unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                thread::yield_now();
                inside.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn idle_keys_are_pruned_past_threshold() {
    let locks = KeyedLocks::new();
    let held = locks.handle(&0usize);
    for key in 1..=PRUNE_THRESHOLD {
        drop(locks.handle(&key));
    }
    assert_eq!(locks.len(), PRUNE_THRESHOLD + 1);

    // The next lookup sweeps every key nobody holds
    drop(locks.handle(&usize::MAX));
    assert_eq!(locks.len(), 2);
    assert!(Arc::ptr_eq(&held, &locks.handle(&0usize)));
}
