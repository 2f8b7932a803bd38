use crate::wrapper::to_bench_error;
use kvbench::errors::{BenchError, BenchResult, ErrorKind};
use kvbench::store::{BenchIterator, BenchTransaction};
use redb::{ReadOnlyTable, ReadableTable, StorageError, Table};
use std::ops::Bound;

pub(crate) type Bytes = &'static [u8];

type Entry = (Vec<u8>, Vec<u8>);
type Entries<'a> = Box<dyn Iterator<Item = Result<Entry, StorageError>> + 'a>;

/// One redb transaction bound to the table of a namespace.
///
/// A read transaction on a namespace that was never written has no table;
/// it behaves as an empty bucket.
pub(crate) enum RedbTransaction<'t> {
    Write(Table<'t, Bytes, Bytes>),
    Read(ReadOnlyTable<Bytes, Bytes>),
    Missing,
}

impl<'t> RedbTransaction<'t> {
    fn writer(&mut self) -> BenchResult<&mut Table<'t, Bytes, Bytes>> {
        match self {
            RedbTransaction::Write(table) => Ok(table),
            _ => Err(BenchError::new(
                "Cannot modify data in a read-only transaction",
                ErrorKind::InvalidOperation,
            )),
        }
    }
}

impl BenchTransaction for RedbTransaction<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> BenchResult<()> {
        self.writer()?.insert(key, value).map_err(to_bench_error)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> BenchResult<()> {
        self.writer()?.remove(key).map_err(to_bench_error)?;
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        let found = match self {
            RedbTransaction::Write(table) => table.get(key).map(|v| v.map(|v| v.value().to_vec())),
            RedbTransaction::Read(table) => table.get(key).map(|v| v.map(|v| v.value().to_vec())),
            RedbTransaction::Missing => Ok(None),
        };
        found.map_err(to_bench_error)
    }

    fn iterator(&mut self) -> BenchResult<Box<dyn BenchIterator + '_>> {
        let cursor = match self {
            RedbTransaction::Write(table) => RedbCursor::open(&*table)?,
            RedbTransaction::Read(table) => RedbCursor::open(&*table)?,
            RedbTransaction::Missing => RedbCursor::empty(),
        };
        Ok(Box::new(cursor))
    }
}

/// Cursor over one table.
///
/// The cursor is positioned with `first()` when it is opened and keeps that
/// entry pending, so the first `next()` yields the smallest key. The rest of
/// the table is streamed from a range starting after it. An engine error met
/// while advancing occupies one position: `key()` is `None`, `value()` reports
/// a `DecodeError`, and the cursor is exhausted afterwards.
pub(crate) struct RedbCursor<'a> {
    pending: Option<Entry>,
    rest: Option<Entries<'a>>,
    current: Option<Entry>,
    error: Option<BenchError>,
}

impl<'a> RedbCursor<'a> {
    pub(crate) fn open<T>(table: &'a T) -> BenchResult<RedbCursor<'a>>
    where
        T: ReadableTable<Bytes, Bytes>,
    {
        let first = table
            .first()
            .map_err(to_bench_error)?
            .map(|(key, value)| (key.value().to_vec(), value.value().to_vec()));

        let Some(first) = first else {
            return Ok(RedbCursor::empty());
        };

        let bounds = (Bound::Excluded(first.0.as_slice()), Bound::Unbounded);
        let rest = table
            .range::<&[u8]>(bounds)
            .map_err(to_bench_error)?
            .map(|item| item.map(|(key, value)| (key.value().to_vec(), value.value().to_vec())));

        Ok(RedbCursor {
            pending: Some(first),
            rest: Some(Box::new(rest)),
            current: None,
            error: None,
        })
    }

    pub(crate) fn empty() -> RedbCursor<'a> {
        RedbCursor {
            pending: None,
            rest: None,
            current: None,
            error: None,
        }
    }

    #[cfg(test)]
    fn from_entries(first: Entry, rest: Entries<'a>) -> RedbCursor<'a> {
        RedbCursor {
            pending: Some(first),
            rest: Some(rest),
            current: None,
            error: None,
        }
    }
}

impl BenchIterator for RedbCursor<'_> {
    fn next(&mut self) -> bool {
        self.current = None;
        if self.error.take().is_some() {
            self.rest = None;
        }

        if let Some(first) = self.pending.take() {
            self.current = Some(first);
            return true;
        }

        let Some(rest) = self.rest.as_mut() else {
            return false;
        };

        match rest.next() {
            Some(Ok(entry)) => {
                self.current = Some(entry);
                true
            }
            Some(Err(err)) => {
                log::error!("Failed to read redb entry: {}", err);
                self.error = Some(BenchError::new_with_cause(
                    "Failed to materialise redb entry",
                    ErrorKind::DecodeError,
                    to_bench_error(err),
                ));
                true
            }
            None => {
                self.rest = None;
                false
            }
        }
    }

    fn key(&self) -> Option<Vec<u8>> {
        self.current.as_ref().map(|(key, _)| key.clone())
    }

    fn value(&self) -> BenchResult<Vec<u8>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match &self.current {
            Some((_, value)) => Ok(value.clone()),
            None => Err(BenchError::new(
                "Cursor is not positioned on an entry",
                ErrorKind::DecodeError,
            )),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        self.rest = None;
        self.current = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &[u8], value: &[u8]) -> Entry {
        (key.to_vec(), value.to_vec())
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = RedbCursor::empty();
        assert!(!cursor.next());
        assert_eq!(cursor.key(), None);
        assert_eq!(cursor.value().unwrap_err().kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_pending_first_entry_comes_first() {
        let rest: Entries<'_> = Box::new(vec![Ok(entry(b"b", b"2"))].into_iter());
        let mut cursor = RedbCursor::from_entries(entry(b"a", b"1"), rest);
        assert_eq!(cursor.key(), None);

        assert!(cursor.next());
        assert_eq!(cursor.key(), Some(b"a".to_vec()));
        assert!(cursor.next());
        assert_eq!(cursor.value().unwrap(), b"2".to_vec());
        assert!(!cursor.next());
        assert!(!cursor.next());
    }

    #[test]
    fn test_storage_error_becomes_decode_error() {
        let io = std::io::Error::other("read failed");
        let rest: Entries<'_> = Box::new(
            vec![Err(StorageError::Io(io)), Ok(entry(b"c", b"3"))].into_iter(),
        );
        let mut cursor = RedbCursor::from_entries(entry(b"a", b"1"), rest);

        assert!(cursor.next());
        assert!(cursor.next());
        assert_eq!(cursor.key(), None);
        let err = cursor.value().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DecodeError);
        assert!(!cursor.next());
    }

    #[test]
    fn test_close_is_idempotent() {
        let rest: Entries<'_> = Box::new(std::iter::empty());
        let mut cursor = RedbCursor::from_entries(entry(b"a", b"1"), rest);
        cursor.close();
        cursor.close();
        assert!(!cursor.next());
    }
}
