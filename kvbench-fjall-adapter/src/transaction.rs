use crate::prefix::prefixed_key;
use crate::wrapper::to_bench_error;
use fjall::{Batch, ReadTransaction, TxPartitionHandle, UserKey, UserValue, WriteTransaction};
use kvbench::errors::{BenchError, BenchResult, ErrorKind};
use kvbench::store::{BenchIterator, BenchTransaction};

type PrefixEntries<'a> = Box<dyn Iterator<Item = fjall::Result<(UserKey, UserValue)>> + 'a>;

pub(crate) enum FjallTxKind<'a> {
    Write(WriteTransaction<'a>),
    Read(ReadTransaction),
    /// Writes staged in an atomic batch; reads come from the snapshot taken
    /// when the update started and never see the staged writes.
    Batch(Batch, ReadTransaction),
}

/// One fjall transaction scoped to a namespace prefix.
pub(crate) struct FjallTransaction<'a> {
    kind: FjallTxKind<'a>,
    partition: &'a TxPartitionHandle,
    prefix: &'a [u8],
}

impl<'a> FjallTransaction<'a> {
    pub(crate) fn new(
        kind: FjallTxKind<'a>,
        partition: &'a TxPartitionHandle,
        prefix: &'a [u8],
    ) -> Self {
        FjallTransaction {
            kind,
            partition,
            prefix,
        }
    }

    pub(crate) fn commit(self) -> BenchResult<()> {
        match self.kind {
            FjallTxKind::Write(tx) => tx.commit().map_err(|err| {
                log::error!("Failed to commit fjall transaction: {}", err);
                to_bench_error(err)
            }),
            FjallTxKind::Batch(batch, _) => batch.commit().map_err(|err| {
                log::error!("Failed to commit fjall write batch: {}", err);
                to_bench_error(err)
            }),
            FjallTxKind::Read(_) => Ok(()),
        }
    }

    /// Discards every staged write. A batch is dropped without being applied.
    pub(crate) fn rollback(self) {
        if let FjallTxKind::Write(tx) = self.kind {
            tx.rollback();
        }
    }
}

fn read_only_error() -> BenchError {
    BenchError::new(
        "Cannot modify data in a read-only transaction",
        ErrorKind::InvalidOperation,
    )
}

impl BenchTransaction for FjallTransaction<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> BenchResult<()> {
        let full_key = prefixed_key(self.prefix, key);
        match &mut self.kind {
            FjallTxKind::Write(tx) => tx.insert(self.partition, full_key, value),
            FjallTxKind::Batch(batch, _) => batch.insert(self.partition.inner(), full_key, value),
            FjallTxKind::Read(_) => return Err(read_only_error()),
        }
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> BenchResult<()> {
        let full_key = prefixed_key(self.prefix, key);
        match &mut self.kind {
            FjallTxKind::Write(tx) => tx.remove(self.partition, full_key),
            FjallTxKind::Batch(batch, _) => batch.remove(self.partition.inner(), full_key),
            FjallTxKind::Read(_) => return Err(read_only_error()),
        }
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        let full_key = prefixed_key(self.prefix, key);
        let found = match &self.kind {
            FjallTxKind::Write(tx) => tx.get(self.partition, full_key),
            FjallTxKind::Read(tx) | FjallTxKind::Batch(_, tx) => tx.get(self.partition, full_key),
        };
        found
            .map(|value| value.map(|v| v.to_vec()))
            .map_err(to_bench_error)
    }

    fn iterator(&mut self) -> BenchResult<Box<dyn BenchIterator + '_>> {
        let FjallTransaction {
            kind,
            partition,
            prefix,
        } = self;
        let prefix = *prefix;
        let entries: PrefixEntries<'_> = match kind {
            FjallTxKind::Write(tx) => Box::new(tx.prefix(*partition, prefix)),
            FjallTxKind::Read(tx) | FjallTxKind::Batch(_, tx) => {
                Box::new(tx.prefix(*partition, prefix))
            }
        };
        Ok(Box::new(FjallIterator::new(entries, prefix.len())))
    }
}

/// Cursor over one namespace prefix.
///
/// The prefix scan is seeked to the namespace prefix when created, so the
/// first `next()` lands on the smallest key. Returned keys have the prefix
/// stripped. An engine error met while advancing occupies one position: its
/// key is `None`, `value()` reports it as a `DecodeError`, and the cursor is
/// exhausted afterwards.
pub(crate) struct FjallIterator<'a> {
    entries: Option<PrefixEntries<'a>>,
    prefix_len: usize,
    current: Option<(Vec<u8>, Vec<u8>)>,
    error: Option<BenchError>,
}

impl<'a> FjallIterator<'a> {
    pub(crate) fn new(entries: PrefixEntries<'a>, prefix_len: usize) -> Self {
        FjallIterator {
            entries: Some(entries),
            prefix_len,
            current: None,
            error: None,
        }
    }
}

impl BenchIterator for FjallIterator<'_> {
    fn next(&mut self) -> bool {
        self.current = None;
        if self.error.take().is_some() {
            self.entries = None;
        }

        let Some(entries) = self.entries.as_mut() else {
            return false;
        };

        match entries.next() {
            Some(Ok((key, value))) => {
                let key = key.get(self.prefix_len..).unwrap_or_default().to_vec();
                self.current = Some((key, value.to_vec()));
                true
            }
            Some(Err(err)) => {
                log::error!("Failed to read fjall entry: {}", err);
                self.error = Some(BenchError::new_with_cause(
                    "Failed to materialise fjall entry",
                    ErrorKind::DecodeError,
                    to_bench_error(err),
                ));
                true
            }
            None => {
                self.entries = None;
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
                "Iterator is not positioned on an entry",
                ErrorKind::DecodeError,
            )),
        }
    }

    fn close(&mut self) {
        self.entries = None;
        self.current = None;
        self.error = None;
    }
}
