use fjall::{Config, PartitionCreateOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

const MIB: u64 = 1_024 * 1_024;

#[derive(Clone)]
/// Fjall keyspace configuration.
///
/// A cloneable, thread-safe holder for the fjall tuning parameters the
/// benchmark varies. Clones share the same values.
///
/// Usage: build through [`FjallStore::with_config()`](crate::FjallStore::with_config)
/// and one of its profiles, or use `FjallConfig::new()` for the conservative
/// defaults.
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl Default for FjallConfig {
    fn default() -> Self {
        FjallConfig::new()
    }
}

impl FjallConfig {
    /// Creates a configuration with the conservative defaults:
    /// - Memtable: 16 MB per partition
    /// - Write buffer: 64 MB
    /// - Max journaling size: 512 MB
    /// - Block cache: 32 MB
    /// - Flush workers: number of available CPU cores
    /// - Compaction workers: half of available CPU cores
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    /// Translates this config into fjall's keyspace config rooted at `path`.
    pub(crate) fn keyspace_config(&self, path: &Path) -> Config {
        Config::new(path)
            .manual_journal_persist(self.manual_journal_persist())
            .flush_workers(self.flush_workers())
            .compaction_workers(self.compaction_workers())
            .cache_size(self.cache_size())
            .max_journaling_size(self.max_journaling_size())
            .max_write_buffer_size(self.max_write_buffer_size())
    }

    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default().max_memtable_size(self.max_memtable_size())
    }

    /// Directory of the keyspace, `None` until one is configured or chosen by
    /// `setup`.
    #[inline]
    pub fn db_path(&self) -> Option<PathBuf> {
        self.inner.db_path.get().cloned()
    }

    /// Sets the directory once. Later calls are ignored.
    #[inline]
    pub(crate) fn set_db_path(&self, path: PathBuf) {
        let _ = self.inner.db_path.set(path);
    }

    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed)
    }

    /// Whether `update` stages its writes in an atomic write batch instead of
    /// a write transaction.
    #[inline]
    pub fn write_batch(&self) -> bool {
        self.inner.write_batch.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_write_batch(&self, v: bool) {
        self.inner.write_batch.store(v, Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, count: usize) {
        self.inner.flush_workers.store(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, count: usize) {
        self.inner.compaction_workers.store(count, Ordering::Relaxed)
    }

    /// Block cache capacity in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, bytes: u64) {
        self.inner.cache_size.store(bytes, Ordering::Relaxed)
    }

    /// Journal size after which fjall forces memtables to flush.
    #[inline]
    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_journaling_size(&self, bytes: u64) {
        self.inner.max_journaling_size.store(bytes, Ordering::Relaxed)
    }

    /// Total memtable size across partitions before writes are throttled.
    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_write_buffer_size(&self, bytes: u64) {
        self.inner.max_write_buffer_size.store(bytes, Ordering::Relaxed)
    }

    /// Memtable size of the benchmark partition before it is flushed.
    #[inline]
    pub fn max_memtable_size(&self) -> u32 {
        self.inner.max_memtable_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_memtable_size(&self, bytes: u32) {
        self.inner.max_memtable_size.store(bytes, Ordering::Relaxed)
    }
}

struct FjallConfigInner {
    db_path: OnceLock<PathBuf>,
    manual_journal_persist: AtomicBool,
    write_batch: AtomicBool,
    flush_workers: AtomicUsize,
    compaction_workers: AtomicUsize,
    cache_size: AtomicU64,
    max_journaling_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    max_memtable_size: AtomicU32,
}

impl FjallConfigInner {
    pub const DEFAULT_CACHE_MB: u64 = 32;
    pub const DEFAULT_WRITE_BUFFER_MB: u64 = 64;
    pub const DEFAULT_MAX_JOURNALING_MB: u64 = 512;
    pub const DEFAULT_MEMTABLE_MB: u32 = 16;

    fn new() -> FjallConfigInner {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        FjallConfigInner {
            db_path: OnceLock::new(),
            manual_journal_persist: AtomicBool::new(false),
            write_batch: AtomicBool::new(false),
            flush_workers: AtomicUsize::new(cpus.max(1)),
            compaction_workers: AtomicUsize::new((cpus / 2).max(1)),
            cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * MIB),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * MIB),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * MIB),
            max_memtable_size: AtomicU32::new(Self::DEFAULT_MEMTABLE_MB * 1_024 * 1_024),
        }
    }
}
