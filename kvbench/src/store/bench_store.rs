use crate::errors::BenchResult;
use crate::namespace::Namespace;
use crate::store::BenchTransaction;
use std::ops::Deref;
use std::sync::Arc;

/// Closure run inside one transaction.
pub type TransactionFn<'f> = &'f mut dyn FnMut(&mut dyn BenchTransaction) -> BenchResult<()>;

/// Low-level interface every storage backend implements.
///
/// # Purpose
/// Lets the same benchmark code run unmodified against engines with different
/// addressing and iteration schemes. Buckets, partitions, key prefixes and
/// cursor positioning are the provider's business; callers only pass a
/// [`Namespace`].
///
/// # Lifecycle
/// `setup` once, any number of `update`/`view` calls, `close`, then `cleanup`
/// to remove whatever `setup` put on disk.
///
/// # Implementations
/// - `InMemoryStore`: reference implementation without disk state
/// - `RedbStore`: hierarchical buckets on redb
/// - `FjallStore`: flat prefixed keyspace on fjall
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. The harness issues one transaction at a
/// time per store; concurrent `update` calls get whatever isolation the engine
/// provides.
pub trait BenchStoreProvider: Send + Sync {
    /// Allocates the backend's resources.
    ///
    /// # Returns
    /// * `Ok(())` once the store is ready for transactions
    /// * `Err(BenchError)` with `InitializationError` if storage cannot be allocated
    fn setup(&self) -> BenchResult<()>;

    /// Runs `f` inside one read-write transaction on `namespace`.
    ///
    /// The transaction commits when `f` returns `Ok(())` and is aborted
    /// otherwise. The closure's error is returned unmodified.
    fn update(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()>;

    /// Runs `f` inside one read-only transaction on `namespace`.
    ///
    /// `set` and `delete` fail with `InvalidOperation` inside a view.
    fn view(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()>;

    /// Releases engine resources. Later transactions fail with
    /// `StoreAlreadyClosed`.
    fn close(&self) -> BenchResult<()>;

    /// Deletes the on-disk state created by `setup`. Safe after `close`.
    fn cleanup(&self) -> BenchResult<()>;

    /// Backend identifier including the wrapped engine version.
    fn identify(&self) -> String;
}

/// High-level handle to a storage backend.
///
/// # Purpose
/// `BenchStore` wraps a concrete [`BenchStoreProvider`] in an `Arc` so it can
/// be cloned cheaply and handed to the driver and to test code alike.
///
/// # Usage Example
/// ```rust
/// use kvbench::namespace::Namespace;
/// use kvbench::store::memory::InMemoryStore;
/// use kvbench::store::{BenchStore, BenchTransaction};
///
/// let store = BenchStore::new(InMemoryStore::new());
/// store.setup().unwrap();
///
/// let ns = Namespace::named(b"TestBucket");
/// store.update(&ns, &mut |tx: &mut dyn BenchTransaction| tx.set(b"k", b"v")).unwrap();
///
/// let mut value = None;
/// store.view(&ns, &mut |tx: &mut dyn BenchTransaction| {
///     value = tx.get(b"k")?;
///     Ok(())
/// }).unwrap();
/// assert_eq!(value, Some(b"v".to_vec()));
/// ```
#[derive(Clone)]
pub struct BenchStore {
    inner: Arc<dyn BenchStoreProvider>,
}

impl BenchStore {
    /// Creates a new `BenchStore` wrapping a provider implementation.
    pub fn new<T: BenchStoreProvider + 'static>(inner: T) -> Self {
        BenchStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for BenchStore {
    type Target = Arc<dyn BenchStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
