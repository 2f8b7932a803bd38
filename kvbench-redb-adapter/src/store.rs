use crate::builder::RedbStoreBuilder;
use crate::config::RedbConfig;
use crate::naming::table_name;
use crate::transaction::{Bytes, RedbTransaction};
use crate::version::redb_version;
use crate::wrapper::{to_bench_error, to_init_error};
use dashmap::DashMap;
use kvbench::errors::{BenchError, BenchResult, ErrorKind};
use kvbench::namespace::Namespace;
use kvbench::paths::{claim_dir, random_temp_path, remove_dir, remove_file};
use kvbench::store::{BenchStoreProvider, TransactionFn};
use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, TableDefinition, TableError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
/// Redb-based benchmark store.
///
/// The hierarchical backend: every namespace is its own table in one redb
/// database file, and the root namespace is the default bucket. Redb gives
/// MVCC snapshot reads and a single writer at a time.
///
/// Usage: create via `RedbStore::with_config()`, wrap in a `BenchStore` and
/// call `setup()`.
pub struct RedbStore {
    inner: Arc<RedbStoreInner>,
}

impl Default for RedbStore {
    fn default() -> Self {
        RedbStore::new(RedbConfig::default())
    }
}

impl RedbStore {
    #[inline]
    pub fn new(config: RedbConfig) -> RedbStore {
        RedbStore {
            inner: Arc::new(RedbStoreInner::new(config)),
        }
    }

    #[inline]
    pub fn with_config() -> RedbStoreBuilder {
        RedbStoreBuilder::new()
    }

    #[inline]
    pub fn config(&self) -> RedbConfig {
        self.inner.config.clone()
    }

    /// Database directory, known once configured or set up.
    #[inline]
    pub fn db_dir(&self) -> Option<PathBuf> {
        self.inner.config.db_dir()
    }
}

impl BenchStoreProvider for RedbStore {
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
        match redb_version() {
            Ok(version) => format!("redb-{}", version),
            Err(err) => {
                log::error!("Failed to read redb version: {}", err);
                "redb-unknown".to_string()
            }
        }
    }
}

#[derive(Default)]
enum RedbState {
    #[default]
    Created,
    Open(Database),
    Closed,
}

struct RedbStoreInner {
    config: RedbConfig,
    state: RwLock<RedbState>,
    tables: DashMap<Namespace, Arc<str>>,
    // set once setup created the database directory itself
    owns_dir: AtomicBool,
}

impl RedbStoreInner {
    fn new(config: RedbConfig) -> RedbStoreInner {
        RedbStoreInner {
            config,
            state: RwLock::new(RedbState::Created),
            tables: DashMap::new(),
            owns_dir: AtomicBool::new(false),
        }
    }

    fn setup(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        if let RedbState::Open(_) = *state {
            return Err(BenchError::new(
                "Redb store is already set up",
                ErrorKind::InvalidOperation,
            ));
        }

        let dir = match self.config.db_dir() {
            Some(dir) => dir,
            None => {
                let dir = random_temp_path("redb");
                self.config.set_db_dir(dir.clone());
                dir
            }
        };
        if claim_dir(&dir)? {
            self.owns_dir.store(true, Ordering::Relaxed);
        }
        let file = dir.join(self.config.file_name());

        let db = Database::builder()
            .set_cache_size(self.config.cache_size())
            .create(&file)
            .map_err(|err| {
                log::error!("Failed to open redb database at {}: {}", file.display(), err);
                to_init_error(err)
            })?;
        create_default_bucket(&db, self.config.default_bucket())?;

        log::debug!("Redb store opened at {}", file.display());
        *state = RedbState::Open(db);
        Ok(())
    }

    fn update(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let state = self.state.read();
        let db = open_database(&state)?;
        let name = self.table_name(namespace);

        let txn = db.begin_write().map_err(to_bench_error)?;
        let result = {
            let table = txn
                .open_table(TableDefinition::<Bytes, Bytes>::new(&name))
                .map_err(to_bench_error)?;
            let mut tx = RedbTransaction::Write(table);
            f(&mut tx)
        };

        match result {
            Ok(()) => txn.commit().map_err(|err| {
                log::error!("Failed to commit redb transaction on {}: {}", name, err);
                to_bench_error(err)
            }),
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    log::error!("Failed to abort redb transaction on {}: {}", name, abort_err);
                }
                Err(err)
            }
        }
    }

    fn view(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let state = self.state.read();
        let db = open_database(&state)?;
        let name = self.table_name(namespace);

        let txn = db.begin_read().map_err(to_bench_error)?;
        let mut tx = match txn.open_table(TableDefinition::<Bytes, Bytes>::new(&name)) {
            Ok(table) => RedbTransaction::Read(table),
            Err(TableError::TableDoesNotExist(_)) => RedbTransaction::Missing,
            Err(err) => return Err(to_bench_error(err)),
        };
        f(&mut tx)
    }

    fn close(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        if let RedbState::Open(db) = std::mem::replace(&mut *state, RedbState::Closed) {
            drop(db);
            log::debug!("Redb store closed");
        }
        Ok(())
    }

    /// Removes the directory when `setup` created it. A directory that was
    /// already there keeps everything except the database file.
    fn cleanup(&self) -> BenchResult<()> {
        let state = self.state.read();
        let set_up = match *state {
            RedbState::Open(_) => {
                return Err(BenchError::new(
                    "Redb store must be closed before cleanup",
                    ErrorKind::InvalidOperation,
                ))
            }
            RedbState::Created => false,
            RedbState::Closed => true,
        };
        self.tables.clear();

        if self.owns_dir.load(Ordering::Relaxed) {
            if let Some(dir) = self.config.db_dir() {
                remove_dir(&dir)?;
                log::debug!("Redb store removed {}", dir.display());
            }
        } else if set_up {
            if let Some(file) = self.config.db_file() {
                remove_file(&file)?;
                log::debug!("Redb store removed {}", file.display());
            }
        }
        Ok(())
    }

    fn table_name(&self, namespace: &Namespace) -> Arc<str> {
        if let Some(name) = self.tables.get(namespace) {
            return name.clone();
        }
        let name: Arc<str> = table_name(namespace, self.config.default_bucket()).into();
        self.tables.insert(namespace.clone(), name.clone());
        name
    }
}

fn open_database(state: &RedbState) -> BenchResult<&Database> {
    match state {
        RedbState::Open(db) => Ok(db),
        RedbState::Closed => Err(BenchError::new(
            "Redb store is closed",
            ErrorKind::StoreAlreadyClosed,
        )),
        RedbState::Created => Err(BenchError::new(
            "Redb store is not set up",
            ErrorKind::InvalidOperation,
        )),
    }
}

fn create_default_bucket(db: &Database, bucket: &str) -> BenchResult<()> {
    let txn = db.begin_write().map_err(to_init_error)?;
    txn.open_table(TableDefinition::<Bytes, Bytes>::new(bucket))
        .map_err(to_init_error)?;
    txn.commit().map_err(to_init_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvbench::store::{BenchStore, BenchTransaction};

    fn open_store() -> BenchStore {
        let store = BenchStore::new(RedbStore::default());
        store.setup().unwrap();
        store
    }

    fn dispose(store: &BenchStore) {
        store.close().unwrap();
        store.cleanup().unwrap();
    }

    fn read(store: &BenchStore, ns: &Namespace, key: &[u8]) -> Option<Vec<u8>> {
        let mut found = None;
        store
            .view(ns, &mut |tx: &mut dyn BenchTransaction| {
                found = tx.get(key)?;
                Ok(())
            })
            .unwrap();
        found
    }

    fn keys(store: &BenchStore, ns: &Namespace) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        store
            .view(ns, &mut |tx: &mut dyn BenchTransaction| {
                let mut iter = tx.iterator()?;
                while iter.next() {
                    iter.value()?;
                    keys.push(iter.key().unwrap_or_default());
                }
                iter.close();
                Ok(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_setup_creates_database_file() {
        let redb = RedbStore::default();
        let store = BenchStore::new(redb.clone());
        store.setup().unwrap();

        let dir = redb.db_dir().unwrap();
        assert!(dir.join("redb.db").is_file());
        assert!(dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("redb-")));

        dispose(&store);
        assert!(!dir.exists());
    }

    #[test]
    fn test_setup_twice_fails() {
        let store = open_store();
        assert_eq!(store.setup().unwrap_err().kind(), &ErrorKind::InvalidOperation);
        dispose(&store);
    }

    #[test]
    fn test_use_before_setup_fails() {
        let store = BenchStore::new(RedbStore::default());
        let err = store
            .view(&Namespace::root(), &mut |_tx: &mut dyn BenchTransaction| Ok(()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_root_namespace_uses_default_bucket() {
        let store = open_store();
        // the default bucket exists right after setup
        assert!(keys(&store, &Namespace::root()).is_empty());

        store
            .update(&Namespace::root(), &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"k", b"v")
            })
            .unwrap();
        assert_eq!(read(&store, &Namespace::root(), b"k"), Some(b"v".to_vec()));
        assert_eq!(read(&store, &Namespace::named(b"rand_txns"), b"k"), None);
        dispose(&store);
    }

    #[test]
    fn test_set_get_delete_in_nested_bucket() {
        let store = open_store();
        let ns = Namespace::named(b"TestBucket").nested(b"NestedBucket");

        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"a", b"1")?;
                tx.set(b"b", b"2")?;
                tx.delete(b"a")?;
                assert_eq!(tx.get(b"a")?, None);
                assert_eq!(tx.get(b"b")?, Some(b"2".to_vec()));
                Ok(())
            })
            .unwrap();

        assert_eq!(read(&store, &ns, b"b"), Some(b"2".to_vec()));
        assert_eq!(read(&store, &Namespace::named(b"TestBucket"), b"b"), None);
        dispose(&store);
    }

    #[test]
    fn test_view_of_unknown_bucket_is_empty() {
        let store = open_store();
        let ns = Namespace::named(b"NeverWritten");
        assert_eq!(read(&store, &ns, b"k"), None);
        assert!(keys(&store, &ns).is_empty());

        let err = store
            .view(&ns, &mut |tx: &mut dyn BenchTransaction| tx.set(b"k", b"v"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        dispose(&store);
    }

    #[test]
    fn test_failed_update_is_aborted() {
        let store = open_store();
        let ns = Namespace::named(b"TestBucket");
        let err = store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"a", b"1")?;
                Err(BenchError::new("abort", ErrorKind::AssertionFailure))
            })
            .unwrap_err();
        assert_eq!(err.message(), "abort");
        assert_eq!(read(&store, &ns, b"a"), None);
        dispose(&store);
    }

    #[test]
    fn test_cursor_starts_at_smallest_key() {
        let store = open_store();
        let ns = Namespace::named(b"TestBucket");
        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"c", b"3")?;
                tx.set(b"a", b"1")?;
                tx.set(b"b", b"2")
            })
            .unwrap();

        assert_eq!(keys(&store, &ns), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        dispose(&store);
    }

    #[test]
    fn test_closed_store_rejects_transactions() {
        let store = open_store();
        assert_eq!(store.cleanup().unwrap_err().kind(), &ErrorKind::InvalidOperation);
        store.close().unwrap();
        store.close().unwrap();

        let err = store
            .update(&Namespace::root(), &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"k", b"v")
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
        store.cleanup().unwrap();
        store.cleanup().unwrap();
    }

    #[test]
    fn test_reopen_keeps_committed_data() {
        let dir = random_temp_path("redb");
        let store = BenchStore::new(RedbStore::with_config().db_dir(dir.clone()).build());
        store.setup().unwrap();
        let ns = Namespace::named(b"TestBucket");
        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| tx.set(b"k", b"v"))
            .unwrap();
        store.close().unwrap();

        store.setup().unwrap();
        assert_eq!(read(&store, &ns, b"k"), Some(b"v".to_vec()));
        dispose(&store);
        assert!(!dir.exists());
    }

    #[test]
    fn test_cleanup_keeps_files_of_an_existing_directory() {
        let dir = kvbench::paths::create_temp_dir("redb-existing").unwrap();
        let sentinel = dir.join("sentinel.txt");
        std::fs::write(&sentinel, b"keep me").unwrap();

        let redb = RedbStore::with_config().db_dir(dir.clone()).build();
        let store = BenchStore::new(redb.clone());
        store.setup().unwrap();
        let file = redb.config().db_file().unwrap();
        assert!(file.is_file());

        dispose(&store);
        assert!(!file.exists());
        assert!(sentinel.is_file());
        remove_dir(&dir).unwrap();
    }

    #[test]
    fn test_cleanup_before_setup_leaves_directory() {
        let dir = kvbench::paths::create_temp_dir("redb-existing").unwrap();
        std::fs::write(dir.join("sentinel.txt"), b"keep me").unwrap();

        let store = BenchStore::new(RedbStore::with_config().db_dir(dir.clone()).build());
        store.cleanup().unwrap();
        assert!(dir.join("sentinel.txt").is_file());
        remove_dir(&dir).unwrap();
    }

    #[test]
    fn test_setup_fails_when_directory_cannot_be_created() {
        let parent = kvbench::paths::create_temp_dir("redb-blocked").unwrap();
        let blocker = parent.join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = BenchStore::new(RedbStore::with_config().db_dir(blocker.join("db")).build());
        let err = store.setup().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InitializationError);

        let err = store
            .view(&Namespace::root(), &mut |_tx: &mut dyn BenchTransaction| Ok(()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        store.cleanup().unwrap();
        assert!(blocker.is_file());
        remove_dir(&parent).unwrap();
    }

    #[test]
    fn test_identify_contains_version() {
        assert_eq!(RedbStore::default().identify(), "redb-3.1");
    }
}
