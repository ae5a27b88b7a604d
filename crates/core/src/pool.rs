// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size worker pool backing the asynchronous query variants.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tracing::warn;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Number of query workers. Queries serialize on the database mutex anyway,
/// so a small pool is enough to keep the UI responsive.
pub(crate) const POOL_SIZE: usize = 2;

/// Named worker threads draining a shared job channel. Dropping the pool
/// closes the channel and joins the workers.
pub(crate) struct WorkerPool {
    tx: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Self {
        let (tx, rx) = unbounded::<Job>();
        let handles = (0..size)
            .map(|index| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("pv-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = rx.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        WorkerPool {
            tx: Some(tx),
            handles,
        }
    }

    pub(crate) fn execute(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(tx) = &self.tx {
            if tx.send(Box::new(job)).is_err() {
                warn!("worker pool channel closed, dropping job");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.tx.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
