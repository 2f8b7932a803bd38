use crate::errors::{BenchError, BenchResult, ErrorKind};
use crate::namespace::Namespace;
use crate::store::{BenchIterator, BenchStoreProvider, BenchTransaction, TransactionFn};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap, HashMap};
use std::iter::Peekable;
use std::sync::Arc;

type OrderedMap = BTreeMap<Vec<u8>, Vec<u8>>;
type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

static EMPTY_MAP: OrderedMap = BTreeMap::new();

/// In-memory implementation of the storage contract.
///
/// # Purpose
/// `InMemoryStore` keeps one ordered map per namespace and never touches the
/// disk. It is the reference implementation the core's own tests run the
/// driver against.
///
/// # Characteristics
/// - **Atomic updates**: writes are staged in a per-transaction overlay that is
///   applied on commit and dropped on abort
/// - **Serialised writers**: `update` holds the write lock for the whole closure
/// - **Snapshot reads**: `view` holds the read lock, so no writer can interleave
/// - **Ordered iteration**: base map and overlay are merged lazily in key order
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }
}

impl BenchStoreProvider for InMemoryStore {
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
        "inmemory".to_string()
    }
}

#[derive(Default)]
enum StoreState {
    #[default]
    Created,
    Open(HashMap<Namespace, OrderedMap>),
    Closed,
}

#[derive(Default)]
struct InMemoryStoreInner {
    state: RwLock<StoreState>,
}

impl InMemoryStoreInner {
    fn setup(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        match *state {
            StoreState::Open(_) => Err(BenchError::new(
                "In-memory store is already set up",
                ErrorKind::InvalidOperation,
            )),
            _ => {
                *state = StoreState::Open(HashMap::new());
                log::debug!("In-memory store set up");
                Ok(())
            }
        }
    }

    fn update(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let mut state = self.state.write();
        let maps = match &mut *state {
            StoreState::Open(maps) => maps,
            other => return Err(not_open_error(other)),
        };

        let overlay = {
            let base = maps.get(namespace).unwrap_or(&EMPTY_MAP);
            let mut tx = MemoryTransaction::new(base, false);
            f(&mut tx)?;
            tx.overlay
        };

        if overlay.is_empty() {
            return Ok(());
        }
        let target = maps.entry(namespace.clone()).or_default();
        for (key, value) in overlay {
            match value {
                Some(value) => {
                    target.insert(key, value);
                }
                None => {
                    target.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn view(&self, namespace: &Namespace, f: TransactionFn<'_>) -> BenchResult<()> {
        let state = self.state.read();
        let maps = match &*state {
            StoreState::Open(maps) => maps,
            other => return Err(not_open_error(other)),
        };

        let base = maps.get(namespace).unwrap_or(&EMPTY_MAP);
        let mut tx = MemoryTransaction::new(base, true);
        f(&mut tx)
    }

    fn close(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        if let StoreState::Open(_) = *state {
            log::debug!("In-memory store closed");
        }
        *state = StoreState::Closed;
        Ok(())
    }

    fn cleanup(&self) -> BenchResult<()> {
        let mut state = self.state.write();
        if let StoreState::Open(maps) = &mut *state {
            maps.clear();
        }
        Ok(())
    }
}

fn not_open_error(state: &StoreState) -> BenchError {
    match state {
        StoreState::Closed => {
            BenchError::new("In-memory store is closed", ErrorKind::StoreAlreadyClosed)
        }
        _ => BenchError::new(
            "In-memory store is not set up",
            ErrorKind::InvalidOperation,
        ),
    }
}

struct MemoryTransaction<'a> {
    base: &'a OrderedMap,
    overlay: Overlay,
    read_only: bool,
}

impl<'a> MemoryTransaction<'a> {
    fn new(base: &'a OrderedMap, read_only: bool) -> Self {
        MemoryTransaction {
            base,
            overlay: BTreeMap::new(),
            read_only,
        }
    }

    fn check_writable(&self) -> BenchResult<()> {
        if self.read_only {
            return Err(BenchError::new(
                "Cannot modify data in a read-only transaction",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

impl BenchTransaction for MemoryTransaction<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> BenchResult<()> {
        self.check_writable()?;
        self.overlay.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> BenchResult<()> {
        self.check_writable()?;
        self.overlay.insert(key.to_vec(), None);
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        match self.overlay.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn iterator(&mut self) -> BenchResult<Box<dyn BenchIterator + '_>> {
        Ok(Box::new(MemoryIterator {
            base: self.base.iter().peekable(),
            overlay: self.overlay.iter().peekable(),
            current: None,
            exhausted: false,
        }))
    }
}

/// Merges the committed map with the transaction's staged writes, skipping
/// staged deletions.
struct MemoryIterator<'a> {
    base: Peekable<btree_map::Iter<'a, Vec<u8>, Vec<u8>>>,
    overlay: Peekable<btree_map::Iter<'a, Vec<u8>, Option<Vec<u8>>>>,
    current: Option<(Vec<u8>, Vec<u8>)>,
    exhausted: bool,
}

impl MemoryIterator<'_> {
    fn advance(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        loop {
            let order = match (self.base.peek(), self.overlay.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((base_key, _)), Some((staged_key, _))) => base_key.cmp(staged_key),
            };

            if order == Ordering::Less {
                if let Some((key, value)) = self.base.next() {
                    return Some((key.clone(), value.clone()));
                }
                continue;
            }

            // staged entry shadows the committed one
            if order == Ordering::Equal {
                self.base.next();
            }
            if let Some((key, Some(value))) = self.overlay.next() {
                return Some((key.clone(), value.clone()));
            }
        }
    }
}

impl BenchIterator for MemoryIterator<'_> {
    fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        self.current = self.advance();
        if self.current.is_none() {
            self.exhausted = true;
        }
        self.current.is_some()
    }

    fn key(&self) -> Option<Vec<u8>> {
        self.current.as_ref().map(|(key, _)| key.clone())
    }

    fn value(&self) -> BenchResult<Vec<u8>> {
        match &self.current {
            Some((_, value)) => Ok(value.clone()),
            None => Err(BenchError::new(
                "Iterator is not positioned on an entry",
                ErrorKind::DecodeError,
            )),
        }
    }

    fn close(&mut self) {
        self.current = None;
        self.exhausted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BenchStore;

    fn open_store() -> BenchStore {
        let store = BenchStore::new(InMemoryStore::new());
        store.setup().unwrap();
        store
    }

    fn put(store: &BenchStore, ns: &Namespace, entries: &[(&[u8], &[u8])]) {
        store
            .update(ns, &mut |tx: &mut dyn BenchTransaction| {
                for (key, value) in entries {
                    tx.set(key, value)?;
                }
                Ok(())
            })
            .unwrap();
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

    fn collect_keys(store: &BenchStore, ns: &Namespace) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        store
            .view(ns, &mut |tx: &mut dyn BenchTransaction| {
                let mut iter = tx.iterator()?;
                while iter.next() {
                    keys.extend(iter.key());
                }
                iter.close();
                Ok(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let store = open_store();
        let ns = Namespace::named(b"bucket");
        put(&store, &ns, &[(b"k1", b"v1")]);
        assert_eq!(read(&store, &ns, b"k1"), Some(b"v1".to_vec()));
        assert_eq!(read(&store, &ns, b"missing"), None);
    }

    #[test]
    fn test_delete_removes_key() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"a", b"1"), (b"b", b"2")]);
        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| tx.delete(b"a"))
            .unwrap();
        assert_eq!(read(&store, &ns, b"a"), None);
        assert_eq!(read(&store, &ns, b"b"), Some(b"2".to_vec()));
    }

    #[test]
    fn test_failed_update_leaves_no_trace() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"kept", b"1")]);

        let result = store.update(&ns, &mut |tx: &mut dyn BenchTransaction| {
            tx.set(b"new", b"2")?;
            tx.delete(b"kept")?;
            Err(BenchError::new("abort", ErrorKind::AssertionFailure))
        });

        assert_eq!(result.unwrap_err().kind(), &ErrorKind::AssertionFailure);
        assert_eq!(read(&store, &ns, b"new"), None);
        assert_eq!(read(&store, &ns, b"kept"), Some(b"1".to_vec()));
    }

    #[test]
    fn test_transaction_reads_its_own_writes() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"a", b"old")]);
        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"a", b"new")?;
                tx.set(b"b", b"fresh")?;
                tx.delete(b"a")?;
                assert_eq!(tx.get(b"a")?, None);
                assert_eq!(tx.get(b"b")?, Some(b"fresh".to_vec()));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_iterator_merges_staged_writes_in_order() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"b", b"2"), (b"d", b"4"), (b"f", b"6")]);

        let mut keys = Vec::new();
        store
            .update(&ns, &mut |tx: &mut dyn BenchTransaction| {
                tx.set(b"a", b"1")?;
                tx.set(b"d", b"44")?;
                tx.delete(b"f")?;
                tx.set(b"g", b"7")?;
                let mut iter = tx.iterator()?;
                while iter.next() {
                    keys.push((iter.key().unwrap(), iter.value()?));
                }
                Ok(())
            })
            .unwrap();

        let expected: Vec<(Vec<u8>, Vec<u8>)> = vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"d".to_vec(), b"44".to_vec()),
            (b"g".to_vec(), b"7".to_vec()),
        ];
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_first_next_yields_smallest_key() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"z", b"1"), (b"m", b"2"), (b"c", b"3")]);
        assert_eq!(
            collect_keys(&store, &ns),
            vec![b"c".to_vec(), b"m".to_vec(), b"z".to_vec()]
        );
    }

    #[test]
    fn test_exhausted_iterator_stays_exhausted() {
        let store = open_store();
        let ns = Namespace::root();
        put(&store, &ns, &[(b"only", b"1")]);
        store
            .view(&ns, &mut |tx: &mut dyn BenchTransaction| {
                let mut iter = tx.iterator()?;
                assert!(iter.key().is_none());
                assert!(iter.next());
                assert!(!iter.next());
                assert!(!iter.next());
                assert!(iter.key().is_none());
                assert_eq!(iter.value().unwrap_err().kind(), &ErrorKind::DecodeError);
                iter.close();
                iter.close();
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = open_store();
        let parent = Namespace::named(b"parent");
        let child = parent.nested(b"child");
        put(&store, &parent, &[(b"k", b"parent")]);
        put(&store, &child, &[(b"k", b"child")]);

        assert_eq!(read(&store, &parent, b"k"), Some(b"parent".to_vec()));
        assert_eq!(read(&store, &child, b"k"), Some(b"child".to_vec()));
        assert_eq!(read(&store, &Namespace::root(), b"k"), None);
        assert_eq!(collect_keys(&store, &parent.nested(b"sibling")).len(), 0);
    }

    #[test]
    fn test_view_rejects_writes() {
        let store = open_store();
        let result = store.view(&Namespace::root(), &mut |tx: &mut dyn BenchTransaction| {
            tx.set(b"k", b"v")
        });
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_lifecycle_errors() {
        let store = BenchStore::new(InMemoryStore::new());
        let ns = Namespace::root();
        let before_setup = store.view(&ns, &mut |_tx: &mut dyn BenchTransaction| Ok(()));
        assert_eq!(before_setup.unwrap_err().kind(), &ErrorKind::InvalidOperation);

        store.setup().unwrap();
        assert_eq!(store.setup().unwrap_err().kind(), &ErrorKind::InvalidOperation);

        store.close().unwrap();
        store.close().unwrap();
        let after_close =
            store.update(&ns, &mut |tx: &mut dyn BenchTransaction| tx.set(b"k", b"v"));
        assert_eq!(after_close.unwrap_err().kind(), &ErrorKind::StoreAlreadyClosed);
        store.cleanup().unwrap();
        store.cleanup().unwrap();
    }

    #[test]
    fn test_setup_after_close_starts_empty() {
        let store = open_store();
        put(&store, &Namespace::root(), &[(b"k", b"v")]);
        store.close().unwrap();
        store.cleanup().unwrap();

        store.setup().unwrap();
        assert_eq!(read(&store, &Namespace::root(), b"k"), None);
        assert_eq!(store.identify(), "inmemory");
    }
}
