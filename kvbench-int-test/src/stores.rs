//! Store factory functions for experiments, tests and benches

use kvbench::errors::BenchResult;
use kvbench::store::memory::InMemoryStore;
use kvbench::store::BenchStore;
use kvbench_fjall_adapter::FjallStore;
use kvbench_redb_adapter::RedbStore;
use std::fmt::{Display, Formatter};

/// The engine configurations an experiment can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    Redb,
    Fjall,
    FjallHighThroughput,
    FjallWriteBatch,
    FjallHighThroughputWriteBatch,
}

impl Backend {
    /// Every backend, in the order the runner reports them.
    pub fn all() -> [Backend; 4] {
        [
            Backend::InMemory,
            Backend::Redb,
            Backend::Fjall,
            Backend::FjallHighThroughput,
        ]
    }

    /// Backends that keep state on disk.
    pub fn persistent() -> [Backend; 3] {
        [Backend::Redb, Backend::Fjall, Backend::FjallHighThroughput]
    }

    /// Fjall stores whose updates go through one atomic write batch. Reads in
    /// an update do not see its own writes, so these are kept out of
    /// [`Backend::all`].
    pub fn write_batch() -> [Backend; 2] {
        [Backend::FjallWriteBatch, Backend::FjallHighThroughputWriteBatch]
    }

    /// A fresh, not yet set up store for this backend.
    pub fn new_store(self) -> BenchStore {
        match self {
            Backend::InMemory => BenchStore::new(InMemoryStore::new()),
            Backend::Redb => BenchStore::new(RedbStore::with_config().build()),
            Backend::Fjall => {
                BenchStore::new(FjallStore::with_config().default_profile().build())
            }
            Backend::FjallHighThroughput => BenchStore::new(
                FjallStore::with_config()
                    .high_throughput_profile()
                    .build(),
            ),
            Backend::FjallWriteBatch => BenchStore::new(
                FjallStore::with_config()
                    .default_profile()
                    .write_batch(true)
                    .build(),
            ),
            Backend::FjallHighThroughputWriteBatch => BenchStore::new(
                FjallStore::with_config()
                    .high_throughput_profile()
                    .write_batch(true)
                    .build(),
            ),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::InMemory => write!(f, "inmemory"),
            Backend::Redb => write!(f, "redb"),
            Backend::Fjall => write!(f, "fjall"),
            Backend::FjallHighThroughput => write!(f, "fjall-high-throughput"),
            Backend::FjallWriteBatch => write!(f, "fjall-write-batch"),
            Backend::FjallHighThroughputWriteBatch => {
                write!(f, "fjall-high-throughput-write-batch")
            }
        }
    }
}

/// A set-up store that is closed and cleaned up when dropped.
pub struct BenchContext {
    backend: Backend,
    store: BenchStore,
}

impl BenchContext {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn store(&self) -> BenchStore {
        self.store.clone()
    }
}

impl Drop for BenchContext {
    fn drop(&mut self) {
        if let Err(e) = self.store.close() {
            log::error!("Failed to close {} store during cleanup: {}", self.backend, e);
        }
        if let Err(e) = self.store.cleanup() {
            log::error!("Failed to clean up {} store: {}", self.backend, e);
        }
    }
}

/// Creates and sets up a store for `backend`.
pub fn create_context(backend: Backend) -> BenchResult<BenchContext> {
    let store = backend.new_store();
    store.setup()?;
    Ok(BenchContext { backend, store })
}
