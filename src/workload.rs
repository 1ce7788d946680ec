//! Synthetic contention workload for self-testing
//!
//! Drives worker threads through a shared bounded queue (the deliberate
//! bottleneck) and records one span per burst. The resulting span set has
//! genuine overlap and contention, which makes it useful sample input for
//! the whole pipeline without instrumenting a real system.
//!
//! The store is not internally synchronized, so all workers funnel their
//! `add` calls through one mutex; the pipeline runs only after every worker
//! has joined and the span set is stable.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::span_store::{Nanos, SpanStore};

/// Workload shape
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Concurrent worker threads
    pub workers: usize,
    /// Spans recorded per worker
    pub bursts: u32,
    /// Upper bound on work units per burst
    pub max_burst_tasks: u32,
    /// Capacity of the shared bottleneck queue
    pub queue_depth: usize,
    /// Seed for per-worker burst sizing
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: 64,
            bursts: 4,
            max_burst_tasks: 1_000,
            queue_depth: 16,
            seed: 0,
        }
    }
}

/// Run the workload and return the collected span set, window already
/// bracketed.
pub fn generate(config: &WorkloadConfig) -> SpanStore {
    let mut store = SpanStore::new();
    let clock = Instant::now();
    store.begin_observation(0);

    let store = Arc::new(Mutex::new(store));
    let (tx, rx) = mpsc::sync_channel::<u32>(config.queue_depth.max(1));
    let rx = Arc::new(Mutex::new(rx));

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let store = Arc::clone(&store);
        let tx = tx.clone();
        let rx = Arc::clone(&rx);
        let bursts = config.bursts;
        let max_burst_tasks = config.max_burst_tasks.max(1);
        let seed = config.seed ^ (worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..bursts {
                let start = elapsed_nanos(&clock);
                let tasks = rng.gen_range(0..max_burst_tasks);
                for _ in 0..tasks {
                    if tx.send(1).is_err() {
                        return;
                    }
                    let received = rx.lock().expect("queue receiver poisoned").recv();
                    if received.is_err() {
                        return;
                    }
                    thread::yield_now();
                }
                let stop = elapsed_nanos(&clock);
                let mut store = store.lock().expect("span store poisoned");
                if let Err(err) = store.add(start, stop, f64::from(tasks), 1) {
                    // A burst can collapse to one clock instant; the store
                    // rejects it and the burst is simply not recorded.
                    debug!(%err, "burst span dropped");
                }
            }
        }));
    }
    drop(tx);

    for handle in handles {
        if handle.join().is_err() {
            warn!("workload worker panicked");
        }
    }

    let stop = elapsed_nanos(&clock);
    let mut store = Arc::try_unwrap(store)
        .expect("workers still hold the span store")
        .into_inner()
        .expect("span store poisoned");
    if let Err(err) = store.end_observation(stop) {
        warn!(%err, "observation window rejected");
    }
    store
}

fn elapsed_nanos(clock: &Instant) -> Nanos {
    clock.elapsed().as_nanos() as Nanos
}
