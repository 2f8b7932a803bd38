//! Memory statistics sampling.
//!
//! A [`Profiler`] records [`MemorySnapshot`]s on demand (the driver measures
//! after every batch phase) and optionally on a fixed period from a background
//! thread. Heap figures come from the [`TrackingAllocator`] counters, the
//! process resident size from `sysinfo`.

mod alloc;
mod snapshot;

pub use alloc::*;
pub use snapshot::*;

use crossbeam::channel::{bounded, select, tick, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Thread-safe recorder of memory snapshots.
///
/// Clones share the same series. Reading statistics takes a shared lock;
/// recording a measurement takes the write lock only to append.
#[derive(Clone)]
pub struct Profiler {
    inner: Arc<ProfilerInner>,
}

struct ProfilerInner {
    created: Instant,
    measurements: RwLock<Vec<MemorySnapshot>>,
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl Default for Profiler {
    fn default() -> Self {
        Profiler::new()
    }
}

impl Profiler {
    pub fn new() -> Profiler {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                log::debug!("Process memory unavailable: {}", err);
                None
            }
        };

        Profiler {
            inner: Arc::new(ProfilerInner {
                created: Instant::now(),
                measurements: RwLock::new(Vec::new()),
                system: Mutex::new(System::new()),
                pid,
            }),
        }
    }

    /// Takes a snapshot, appends it to the series and returns it.
    pub fn measure(&self) -> MemorySnapshot {
        let counters = allocation_counters();
        let snapshot = MemorySnapshot {
            offset: self.inner.created.elapsed(),
            alloc_bytes: counters.live_bytes,
            total_alloc_bytes: counters.total_bytes,
            sys_bytes: self.inner.resident_bytes(),
            num_free: counters.frees,
        };
        self.inner.measurements.write().push(snapshot);
        snapshot
    }

    pub fn last_measurement(&self) -> Option<MemorySnapshot> {
        self.inner.measurements.read().last().copied()
    }

    /// Memory line of the latest snapshot, all zeros if none was taken.
    pub fn print_last_measurement(&self) -> String {
        self.last_measurement().unwrap_or_default().to_string()
    }

    pub fn measurements(&self) -> Vec<MemorySnapshot> {
        self.inner.measurements.read().clone()
    }

    pub fn stats(&self) -> ProfilerStats {
        ProfilerStats::from_snapshots(&self.inner.measurements.read())
    }

    pub fn print_stats(&self) -> String {
        self.stats().to_string()
    }

    /// Starts measuring every `period` on a background thread.
    ///
    /// Sampling stops when the returned handle is stopped or dropped.
    pub fn start_sampling(&self, period: Duration) -> SamplerHandle {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let profiler = self.clone();

        let handle = std::thread::spawn(move || {
            let ticker = tick(period);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        profiler.measure();
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
        });

        SamplerHandle {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }
}

impl ProfilerInner {
    fn resident_bytes(&self) -> u64 {
        let pid = match self.pid {
            Some(pid) => pid,
            None => return 0,
        };

        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );
        system.process(pid).map(|process| process.memory()).unwrap_or(0)
    }
}

/// Handle of a periodic sampler thread. Dropping it stops the thread.
pub struct SamplerHandle {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // disconnecting the channel wakes the sampler
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Memory sampler thread panicked");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
