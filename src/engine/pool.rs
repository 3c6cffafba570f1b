//! # engine::pool
//!
//! Bounded worker pool for blocking per-symbol tasks.
//!
//! - At most `workers` tasks run at once.
//! - The caller blocks until every task of the batch is done.
//! - Results come back in completion order, not submission order.
//! - A panicking task is caught and reported for that item only.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use anyhow::Context;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct WorkerPool {
    pool:    ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// `workers` below 1 is treated as 1 (sequential).
    pub fn new(name: &'static str, workers: usize) -> anyhow::Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{name}-worker-{i}"))
            .build()
            .with_context(|| format!("failed to build {name} worker pool"))?;

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` once per item and return `(item, result)` pairs as they
    /// finish. A panic becomes `Err(message)` for its own item.
    pub fn run<I, T, F>(&self, items: Vec<I>, task: F) -> Vec<(I, Result<T, String>)>
    where
        I: Send,
        T: Send,
        F: Fn(&I) -> T + Sync,
    {
        let (tx, rx) = mpsc::channel();
        let task = &task;

        self.pool.scope(|scope| {
            for item in items {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task(&item)))
                        .map_err(panic_message);
                    // Receiver lives until after the scope; send cannot fail.
                    let _ = tx.send((item, result));
                });
            }
        });

        drop(tx);
        rx.into_iter().collect()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("worker panicked: {msg}")
    } else {
        "worker panicked".to_string()
    }
}
