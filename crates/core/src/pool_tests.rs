// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;

#[test]
fn jobs_run_on_worker_threads() {
    let pool = WorkerPool::new(POOL_SIZE);
    let (tx, rx) = crossbeam_channel::bounded(1);
    pool.execute(move || {
        let name = thread::current().name().map(str::to_string);
        tx.send(name).unwrap();
    });
    let name = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .unwrap()
        .unwrap();
    assert!(name.starts_with("pv-worker-"));
}

#[test]
fn drop_joins_after_draining_queued_jobs() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let pool = WorkerPool::new(1);
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    }
    // The pool joined its worker, so every queued job has run.
    assert_eq!(counter.load(Ordering::SeqCst), 16);
}
