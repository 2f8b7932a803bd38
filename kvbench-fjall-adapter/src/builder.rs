use crate::config::FjallConfig;
use crate::store::FjallStore;
use std::path::PathBuf;

const MIB: u64 = 1_024 * 1_024;

/// Builder for a [`FjallStore`].
///
/// Provides the two named profiles the benchmark compares plus individual
/// parameter setters. Setters applied after a profile override it.
///
/// # Examples
///
/// ```rust
/// use kvbench_fjall_adapter::FjallStore;
///
/// let store = FjallStore::with_config()
///     .high_throughput_profile()
///     .flush_workers(2)
///     .build();
/// assert_eq!(store.config().flush_workers(), 2);
/// ```
pub struct FjallStoreBuilder {
    store_config: FjallConfig,
}

impl Default for FjallStoreBuilder {
    fn default() -> Self {
        FjallStoreBuilder::new()
    }
}

impl FjallStoreBuilder {
    #[inline]
    pub fn new() -> FjallStoreBuilder {
        FjallStoreBuilder {
            store_config: FjallConfig::new(),
        }
    }

    /// Conservative engine defaults.
    ///
    /// - 16 MB memtable
    /// - 64 MB write buffer
    /// - 512 MB journal
    #[inline]
    pub fn default_profile(self) -> Self {
        self.max_memtable_size(16 * 1_024 * 1_024)
            .max_write_buffer_size(64 * MIB)
            .max_journaling_size(512 * MIB)
    }

    /// Trades memory for commit throughput.
    ///
    /// The memtable is large enough to hold the biggest single batch the
    /// benchmark commits, so a batch never forces a flush mid-commit.
    ///
    /// - 3072 MB memtable
    /// - 256 MB write buffer
    /// - 4096 MB journal
    #[inline]
    pub fn high_throughput_profile(self) -> Self {
        self.max_memtable_size(3_072 * 1_024 * 1_024)
            .max_write_buffer_size(256 * MIB)
            .max_journaling_size(4_096 * MIB)
    }

    /// Keyspace directory. A fresh temp directory is used when unset.
    #[inline]
    pub fn db_path(self, path: impl Into<PathBuf>) -> Self {
        self.store_config.set_db_path(path.into());
        self
    }

    #[inline]
    pub fn cache_size(self, bytes: u64) -> Self {
        self.store_config.set_cache_size(bytes);
        self
    }

    #[inline]
    pub fn flush_workers(self, count: usize) -> Self {
        self.store_config.set_flush_workers(count);
        self
    }

    #[inline]
    pub fn compaction_workers(self, count: usize) -> Self {
        self.store_config.set_compaction_workers(count);
        self
    }

    #[inline]
    pub fn max_memtable_size(self, bytes: u32) -> Self {
        self.store_config.set_max_memtable_size(bytes);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(self, bytes: u64) -> Self {
        self.store_config.set_max_write_buffer_size(bytes);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, bytes: u64) -> Self {
        self.store_config.set_max_journaling_size(bytes);
        self
    }

    #[inline]
    pub fn manual_journal_persist(self, v: bool) -> Self {
        self.store_config.set_manual_journal_persist(v);
        self
    }

    /// Stages each `update`'s writes in one atomic write batch instead of a
    /// write transaction. Reads inside the update do not see the staged
    /// writes.
    #[inline]
    pub fn write_batch(self, v: bool) -> Self {
        self.store_config.set_write_batch(v);
        self
    }

    pub fn build(self) -> FjallStore {
        FjallStore::new(self.store_config)
    }
}
