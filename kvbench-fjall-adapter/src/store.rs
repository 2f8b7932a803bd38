use crate::builder::FjallStoreBuilder;
use crate::config::FjallConfig;
use crate::prefix::namespace_prefix;
use crate::transaction::{FjallTransaction, FjallTxKind};
use crate::version::fjall_version;
use crate::wrapper::{to_bench_error, to_init_error};
use dashmap::DashMap;
use fjall::{PersistMode, TxKeyspace, TxPartitionHandle};
use kvbench::errors::{BenchError, BenchResult, ErrorKind};
use kvbench::namespace::Namespace;
use kvbench::paths::{claim_dir, create_dir, random_temp_path, remove_dir};
use kvbench::store::{BenchStoreProvider, TransactionFn};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Name of the single partition holding every namespace.
pub const PARTITION_NAME: &str = "kvbench";
/// Sub-directory of the store directory the keyspace lives in.
pub const KEYSPACE_DIR: &str = "keyspace";

#[derive(Clone)]
/// Fjall-based benchmark store.
///
/// A flat backend: one transactional keyspace with a single partition, in
/// which every namespace is a key prefix. Uses the PIMPL pattern with
/// `Arc<FjallStoreInner>` so clones share the same keyspace.
///
/// Characteristics:
/// - Snapshot reads (`view` runs on a read transaction)
/// - Serialised writers (fjall's single-writer transactions)
/// - Namespaces isolated by prefix, see [`crate::prefix`]
/// - Durable close (the journal is synced before the keyspace is dropped)
/// - Optional write-batch mode: `update` stages writes in one atomic batch
///   and reads from a snapshot, see [`FjallStoreBuilder::write_batch`]
///
/// Usage: create via `FjallStore::with_config()` and one of its profiles, wrap
/// in a `BenchStore` and call `setup()`.
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl Default for FjallStore {
    fn default() -> Self {
        FjallStore::new(FjallConfig::new())
    }
}

impl FjallStore {
    #[inline]
    pub fn new(config: FjallConfig) -> FjallStore {
        FjallStore {
            inner: Arc::new(FjallStoreInner::new(config)),
        }
    }

    #[inline]
    pub fn with_config() -> FjallStoreBuilder {
        FjallStoreBuilder::new()
    }

    #[inline]
    pub fn config(&self) -> FjallConfig {
        self.inner.config.clone()
    }

    /// Directory of the store, known once configured or set up.
    #[inline]
    pub fn db_path(&self) -> Option<PathBuf> {
        self.inner.config.db_path()
    }

    /// Directory fjall itself writes to, inside [`db_path`](Self::db_path).
    #[inline]
    pub fn keyspace_path(&self) -> Option<PathBuf> {
        self.db_path().map(|path| keyspace_dir(&path))
    }
}

impl BenchStoreProvider for FjallStore {
    fn setup(&self) -> BenchResult<()> {
        self.inner.setup()
    }

    fn update(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        self.inner.update(namespace, f)
    }

    fn view(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        self.inner.view(namespace, f)
    }

    fn close(&self) -> BenchResult<()> {
        self.inner.close()
    }

    fn cleanup(&self) -> BenchResult<()> {
        self.inner.cleanup()
    }

    fn identify(&self) -> String {
        match fjall_version() {
            Ok(version) => format!("fjall-{}", version),
            Err(err) => {
                log::error!("Failed to read fjall version: {}", err);
                "fjall-unknown".to_string()
            }
        }
    }
}

struct FjallHandles {
    keyspace: TxKeyspace,
    partition: TxPartitionHandle,
}

#[derive(Default)]
enum FjallState {
    #[default]
    Created,
    Open(FjallHandles),
    Closed,
}

impl FjallState {
    fn handles(&self) -> BenchResult<&FjallHandles> {
        match self {
            FjallState::Open(handles) => Ok(handles),
            FjallState::Closed => Err(BenchError::new(
                "Fjall store is closed",
                ErrorKind::StoreAlreadyClosed,
            )),
            FjallState::Created => Err(BenchError::new(
                "Fjall store is not set up",
                ErrorKind::InvalidOperation,
            )),
        }
    }
}

struct FjallStoreInner {
    config: FjallConfig,
    state: RwLock<FjallState>,
    prefixes: DashMap<Namespace, Arc<[u8]>>,
    // set once setup created the store directory itself
    owns_dir: AtomicBool,
}

impl FjallStoreInner {
    fn new(config: FjallConfig) -> FjallStoreInner {
        FjallStoreInner {
            config,
            state: RwLock::new(FjallState::Created),
            prefixes: DashMap::new(),
            owns_dir: AtomicBool::new(false),
        }
    }

    fn setup(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        if let FjallState::Open(_) = *state {
            return Err(BenchError::new(
                "Fjall store is already set up",
                ErrorKind::InvalidOperation,
            ));
        }

        let root = match self.config.db_path() {
            Some(path) => path,
            None => {
                let path = random_temp_path("fjall");
                self.config.set_db_path(path.clone());
                path
            }
        };
        if claim_dir(&root)? {
            self.owns_dir.store(true, Ordering::Relaxed);
        }
        let path = keyspace_dir(&root);
        create_dir(&path)?;

        let keyspace = self
            .config
            .keyspace_config(&path)
            .open_transactional()
            .map_err(|err| {
                log::error!("Failed to open fjall keyspace at {}: {}", path.display(), err);
                to_init_error(err)
            })?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, self.config.partition_config())
            .map_err(|err| {
                log::error!("Failed to open fjall partition {}: {}", PARTITION_NAME, err);
                to_init_error(err)
            })?;

        log::debug!("Fjall store opened at {}", path.display());
        *state = FjallState::Open(FjallHandles {
            keyspace,
            partition,
        });
        Ok(())
    }

    fn update(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let state = self.state.read();
        let handles = state.handles()?;
        let prefix = self.prefix(namespace)?;

        let kind = if self.config.write_batch() {
            FjallTxKind::Batch(handles.keyspace.inner().batch(), handles.keyspace.read_tx())
        } else {
            FjallTxKind::Write(handles.keyspace.write_tx())
        };
        let mut tx = FjallTransaction::new(kind, &handles.partition, &prefix);
        match f(&mut tx) {
            Ok(()) => tx.commit(),
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }

    fn view(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let state = self.state.read();
        let handles = state.handles()?;
        let prefix = self.prefix(namespace)?;

        let mut tx = FjallTransaction::new(
            FjallTxKind::Read(handles.keyspace.read_tx()),
            &handles.partition,
            &prefix,
        );
        f(&mut tx)
    }

    fn close(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        match std::mem::replace(&mut *state, FjallState::Closed) {
            FjallState::Open(handles) => {
                let result = handles
                    .keyspace
                    .persist(PersistMode::SyncAll)
                    .map_err(|err| {
                        log::error!("Failed to persist fjall keyspace: {}", err);
                        to_bench_error(err)
                    });
                drop(handles);
                log::debug!("Fjall store closed");
                result
            }
            _ => Ok(()),
        }
    }

    /// Removes the store directory when `setup` created it. A directory that
    /// was already there only loses the keyspace directory.
    fn cleanup(&self) -> BenchResult<()> {
        let state = self.state.read();
        let set_up = match *state {
            FjallState::Open(_) => {
                return Err(BenchError::new(
                    "Fjall store must be closed before cleanup",
                    ErrorKind::InvalidOperation,
                ))
            }
            FjallState::Created => false,
            FjallState::Closed => true,
        };
        self.prefixes.clear();

        let Some(root) = self.config.db_path() else {
            return Ok(());
        };
        let target = if self.owns_dir.load(Ordering::Relaxed) {
            root
        } else if set_up {
            keyspace_dir(&root)
        } else {
            return Ok(());
        };
        remove_dir(&target)?;
        log::debug!("Fjall store removed {}", target.display());
        Ok(())
    }

    fn prefix(&self, namespace: &Namespace) -> BenchResult<Arc<[u8]>> {
        if let Some(prefix) = self.prefixes.get(namespace) {
            return Ok(prefix.clone());
        }
        let prefix: Arc<[u8]> = namespace_prefix(namespace)?.into();
        self.prefixes.insert(namespace.clone(), prefix.clone());
        Ok(prefix)
    }
}

fn keyspace_dir(root: &Path) -> PathBuf {
    root.join(KEYSPACE_DIR)
}
