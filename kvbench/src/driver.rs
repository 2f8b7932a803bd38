use crate::errors::{BenchError, BenchResult};
use crate::key::Key;
use crate::namespace::Namespace;
use crate::profiler::{is_tracking, MemorySnapshot, Profiler, ProfilerStats};
use crate::store::{BenchStore, BenchTransaction};
use crate::timer::Timer;
use crate::workload::{Batch, WorkloadConfig, WorkloadGenerator};
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Timer event wrapping every batch.
pub const EXPERIMENT_EVENT: &str = "Experiment";

/// Steps of one batch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchPhase {
    Generate,
    Write,
    Delete,
    VerifyDeleted,
    VerifyRetrieved,
    Iterate,
    Done,
}

impl BatchPhase {
    /// The phase that follows `self`. `Done` is terminal.
    pub fn next(self) -> BatchPhase {
        match self {
            BatchPhase::Generate => BatchPhase::Write,
            BatchPhase::Write => BatchPhase::Delete,
            BatchPhase::Delete => BatchPhase::VerifyDeleted,
            BatchPhase::VerifyDeleted => BatchPhase::VerifyRetrieved,
            BatchPhase::VerifyRetrieved => BatchPhase::Iterate,
            BatchPhase::Iterate | BatchPhase::Done => BatchPhase::Done,
        }
    }
}

impl Display for BatchPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Generate => write!(f, "generate"),
            BatchPhase::Write => write!(f, "write"),
            BatchPhase::Delete => write!(f, "delete"),
            BatchPhase::VerifyDeleted => write!(f, "verify-deleted"),
            BatchPhase::VerifyRetrieved => write!(f, "verify-retrieved"),
            BatchPhase::Iterate => write!(f, "iterate"),
            BatchPhase::Done => write!(f, "done"),
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub index: usize,
    pub items_written: usize,
    pub bytes_written: usize,
    pub items_removed: usize,
    pub items_retrieved: usize,
    pub items_iterated: usize,
    /// Seconds this batch added to the experiment timer.
    pub elapsed: f64,
    pub memory: MemorySnapshot,
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub backend: String,
    pub config: WorkloadConfig,
    pub batches: Vec<BatchReport>,
    pub total_elapsed: f64,
    pub stats: ProfilerStats,
}

impl RunReport {
    pub fn bytes_written(&self) -> usize {
        self.batches.iter().map(|batch| batch.bytes_written).sum()
    }

    pub fn items_iterated(&self) -> usize {
        self.batches.iter().map(|batch| batch.items_iterated).sum()
    }
}

/// Runs the write/delete/read/iterate workload against one store.
///
/// Each batch goes through every [`BatchPhase`] in order. A failed
/// post-condition stops the run with an `AssertionFailure`; store errors stop
/// it unchanged. Nothing is retried.
///
/// # Examples
///
/// ```rust
/// use kvbench::driver::BenchmarkDriver;
/// use kvbench::namespace::Namespace;
/// use kvbench::store::memory::InMemoryStore;
/// use kvbench::store::BenchStore;
/// use kvbench::workload::WorkloadConfig;
///
/// let store = BenchStore::new(InMemoryStore::new());
/// store.setup().unwrap();
///
/// let config = WorkloadConfig::quick().number_of_batches(2);
/// let mut driver = BenchmarkDriver::new(store, Namespace::named(b"TestBucket"), config).unwrap();
/// let report = driver.run().unwrap();
/// assert_eq!(report.batches.len(), 2);
/// ```
pub struct BenchmarkDriver<R: RngCore + CryptoRng = OsRng> {
    store: BenchStore,
    namespace: Namespace,
    config: WorkloadConfig,
    generator: WorkloadGenerator<R>,
    timer: Timer,
    profiler: Profiler,
    sample_period: Option<Duration>,
}

impl BenchmarkDriver<OsRng> {
    pub fn new(
        store: BenchStore,
        namespace: Namespace,
        config: WorkloadConfig,
    ) -> BenchResult<Self> {
        let generator = WorkloadGenerator::new(&config);
        BenchmarkDriver::with_generator(store, namespace, config, generator)
    }
}

impl BenchmarkDriver<StdRng> {
    /// Driver whose batches are reproducible for a given seed.
    pub fn seeded(
        store: BenchStore,
        namespace: Namespace,
        config: WorkloadConfig,
        seed: u64,
    ) -> BenchResult<Self> {
        let generator = WorkloadGenerator::seeded(&config, seed);
        BenchmarkDriver::with_generator(store, namespace, config, generator)
    }
}

impl<R: RngCore + CryptoRng> BenchmarkDriver<R> {
    pub fn with_generator(
        store: BenchStore,
        namespace: Namespace,
        config: WorkloadConfig,
        generator: WorkloadGenerator<R>,
    ) -> BenchResult<Self> {
        config.validate()?;
        Ok(BenchmarkDriver {
            store,
            namespace,
            config,
            generator,
            timer: Timer::new(),
            profiler: Profiler::new(),
            sample_period: None,
        })
    }

    /// Records into an existing timer instead of a private one.
    pub fn with_timer(mut self, timer: Timer) -> Self {
        self.timer = timer;
        self
    }

    /// Records into an existing profiler instead of a private one.
    pub fn with_profiler(mut self, profiler: Profiler) -> Self {
        self.profiler = profiler;
        self
    }

    /// Also samples memory every `period` on a background thread while
    /// [`run`](Self::run) executes.
    pub fn with_sampling(mut self, period: Duration) -> Self {
        self.sample_period = Some(period);
        self
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Executes every configured batch and logs the measurements.
    pub fn run(&mut self) -> BenchResult<RunReport> {
        let backend = self.store.identify();
        let batches = self.config.number_of_batches;
        let interval = self.config.log_interval();
        log::debug!(
            "Starting {} batches of {} items against {} in {}",
            batches,
            self.config.batch_size_items,
            backend,
            self.namespace
        );

        if !is_tracking() {
            log::warn!("No tracking allocator installed, heap figures will read zero");
        }
        let sampler = self
            .sample_period
            .map(|period| self.profiler.start_sampling(period));

        let mut reports = Vec::with_capacity(batches);
        for index in 0..batches {
            let report = self.run_batch(index)?;
            if index % interval == 0 {
                log::info!(
                    "Batch {}/{}\n{}\nTotal time: {}s\t Delta time: {}s",
                    index,
                    batches,
                    report.memory,
                    self.timer.total_elapsed(EXPERIMENT_EVENT),
                    report.elapsed
                );
            }
            reports.push(report);
        }
        if let Some(sampler) = sampler {
            sampler.stop();
        }

        log::info!("Timer results:\n{}", self.timer.print(EXPERIMENT_EVENT));
        log::info!("Profiler results:\n{}", self.profiler.print_stats());

        let total_elapsed = reports.iter().map(|report| report.elapsed).sum();
        Ok(RunReport {
            backend,
            config: self.config.clone(),
            batches: reports,
            total_elapsed,
            stats: self.profiler.stats(),
        })
    }

    /// Executes a single batch under the experiment timer.
    pub fn run_batch(&mut self, index: usize) -> BenchResult<BatchReport> {
        let before = self.timer.total_elapsed(EXPERIMENT_EVENT);
        let mut report = {
            let _guard = self.timer.scoped(EXPERIMENT_EVENT);
            self.execute_phases(index)?
        };
        report.elapsed = self.timer.total_elapsed(EXPERIMENT_EVENT) - before;
        Ok(report)
    }

    fn execute_phases(&mut self, index: usize) -> BenchResult<BatchReport> {
        enter(index, BatchPhase::Generate);
        let batch = self.generator.generate()?;
        let partition = batch.partition(self.config.items_removed, self.config.items_retrieved);

        enter(index, BatchPhase::Write);
        write_batch(&self.store, &self.namespace, &batch)?;
        self.profiler.measure();

        enter(index, BatchPhase::Delete);
        delete_keys(&self.store, &self.namespace, &partition.removed)?;

        enter(index, BatchPhase::VerifyDeleted);
        verify_deleted(&self.store, &self.namespace, &partition.removed)?;
        self.profiler.measure();

        enter(index, BatchPhase::VerifyRetrieved);
        verify_retrieved(&self.store, &self.namespace, &batch, &partition.retrieved)?;
        self.profiler.measure();

        enter(index, BatchPhase::Iterate);
        let remaining = batch.len() - partition.removed.len();
        let items_iterated = iterate_entries(
            &self.store,
            &self.namespace,
            self.config.items_iterated,
            remaining,
        )?;
        let memory = self.profiler.measure();

        enter(index, BatchPhase::Done);
        Ok(BatchReport {
            index,
            items_written: batch.len(),
            bytes_written: batch.value_bytes(),
            items_removed: partition.removed.len(),
            items_retrieved: partition.retrieved.len(),
            items_iterated,
            elapsed: 0.0,
            memory,
        })
    }
}

#[inline]
fn enter(index: usize, phase: BatchPhase) {
    log::debug!("Batch {} entering phase {}", index, phase);
}

fn write_batch(store: &BenchStore, namespace: &Namespace, batch: &Batch) -> BenchResult<()> {
    store.update(namespace, &mut |tx: &mut dyn BenchTransaction| {
        for (key, value) in batch.iter() {
            tx.set(key.as_bytes(), value)?;
        }
        Ok(())
    })
}

fn delete_keys(store: &BenchStore, namespace: &Namespace, keys: &[Key]) -> BenchResult<()> {
    store.update(namespace, &mut |tx: &mut dyn BenchTransaction| {
        for key in keys {
            tx.delete(key.as_bytes())?;
        }
        Ok(())
    })
}

fn verify_deleted(store: &BenchStore, namespace: &Namespace, keys: &[Key]) -> BenchResult<()> {
    store.view(namespace, &mut |tx: &mut dyn BenchTransaction| {
        for key in keys {
            if let Some(value) = tx.get(key.as_bytes())? {
                return Err(BenchError::assertion(
                    &format!("deleted key {}", key),
                    "absent",
                    format!("{} bytes", value.len()),
                ));
            }
        }
        Ok(())
    })
}

fn verify_retrieved(
    store: &BenchStore,
    namespace: &Namespace,
    batch: &Batch,
    keys: &[Key],
) -> BenchResult<()> {
    store.view(namespace, &mut |tx: &mut dyn BenchTransaction| {
        for key in keys {
            let expected = batch.get(key).unwrap_or_default();
            match tx.get(key.as_bytes())? {
                None => {
                    return Err(BenchError::assertion(
                        &format!("retrieved key {}", key),
                        format!("{} bytes", expected.len()),
                        "absent",
                    ));
                }
                Some(actual) if actual != expected => {
                    return Err(BenchError::assertion(
                        &format!("retrieved key {}", key),
                        format!("{} bytes as written", expected.len()),
                        format!("{} bytes that differ", actual.len()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    })
}

/// Visits up to `cap` entries and checks that none is empty. At least
/// `min(cap, known)` entries must be visited, `known` being the entries this
/// batch left in the namespace.
fn iterate_entries(
    store: &BenchStore,
    namespace: &Namespace,
    cap: usize,
    known: usize,
) -> BenchResult<usize> {
    if cap == 0 {
        return Ok(0);
    }

    let mut visited = 0usize;
    store.view(namespace, &mut |tx: &mut dyn BenchTransaction| {
        visited = 0;
        let mut iter = tx.iterator()?;
        while visited < cap && iter.next() {
            let value = iter.value()?;
            let key = iter.key().unwrap_or_default();
            if key.is_empty() {
                return Err(BenchError::assertion("iterated key", "non-empty", "empty"));
            }
            if value.is_empty() {
                return Err(BenchError::assertion(
                    "iterated value",
                    "non-empty",
                    "empty",
                ));
            }
            visited += 1;
        }
        iter.close();
        Ok(())
    })?;

    let expected = cap.min(known);
    if visited < expected {
        return Err(BenchError::assertion(
            "iterated entries",
            format!("at least {}", expected),
            visited,
        ));
    }
    Ok(visited)
}
