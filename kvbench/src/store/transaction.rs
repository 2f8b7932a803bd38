use crate::errors::BenchResult;

/// One open transaction of a backend.
///
/// A transaction is borrowed by the closure passed to
/// [`BenchStoreProvider::update`](crate::store::BenchStoreProvider::update) or
/// [`BenchStoreProvider::view`](crate::store::BenchStoreProvider::view) and
/// cannot outlive that call. Every operation is scoped to the namespace the
/// transaction was opened for.
pub trait BenchTransaction {
    /// Inserts or replaces `key` with `value`.
    fn set(&mut self, key: &[u8], value: &[u8]) -> BenchResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> BenchResult<()>;

    /// Reads a copy of the value stored under `key`.
    ///
    /// Absence is reported as `Ok(None)` so that a missing key can be told
    /// apart from an engine failure.
    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>>;

    /// Opens a forward cursor over the namespace, in ascending key order.
    ///
    /// The first call to [`BenchIterator::next`] on the returned cursor lands
    /// on the smallest key, whatever positioning the engine needs for that.
    fn iterator(&mut self) -> BenchResult<Box<dyn BenchIterator + '_>>;
}

/// A forward-only cursor bound to one open transaction.
///
/// A fresh cursor is positioned before its first entry. Keys and values are
/// returned as copies that stay valid after the cursor moves or closes.
pub trait BenchIterator {
    /// Advances to the next entry and returns whether one exists.
    /// Once it returns `false` the cursor is exhausted for good.
    fn next(&mut self) -> bool;

    /// Copy of the current key, `None` when the cursor is not on an entry.
    fn key(&self) -> Option<Vec<u8>>;

    /// Copy of the current value.
    ///
    /// Fails with [`ErrorKind::DecodeError`](crate::errors::ErrorKind::DecodeError)
    /// when the engine could not materialise the entry.
    fn value(&self) -> BenchResult<Vec<u8>>;

    /// Releases the engine cursor. Safe to call more than once.
    fn close(&mut self);
}
