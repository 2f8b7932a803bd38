use crate::config::{RedbConfig, DEFAULT_BUCKET, DEFAULT_CACHE_SIZE, DEFAULT_FILE_NAME};
use crate::store::RedbStore;
use std::path::PathBuf;

/// Builder for a [`RedbStore`].
///
/// ```rust
/// use kvbench_redb_adapter::RedbStore;
///
/// let store = RedbStore::with_config()
///     .cache_size(16 * 1024 * 1024)
///     .default_bucket("root_txns")
///     .build();
/// assert_eq!(store.config().default_bucket(), "root_txns");
/// ```
pub struct RedbStoreBuilder {
    db_dir: Option<PathBuf>,
    file_name: String,
    default_bucket: String,
    cache_size: usize,
}

impl Default for RedbStoreBuilder {
    fn default() -> Self {
        RedbStoreBuilder::new()
    }
}

impl RedbStoreBuilder {
    pub fn new() -> RedbStoreBuilder {
        RedbStoreBuilder {
            db_dir: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
            default_bucket: DEFAULT_BUCKET.to_string(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    /// Directory holding the database file. A fresh temp directory is used
    /// when unset.
    pub fn db_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.db_dir = Some(dir.into());
        self
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// Table backing the root namespace.
    pub fn default_bucket(mut self, name: &str) -> Self {
        self.default_bucket = name.to_string();
        self
    }

    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    pub fn build(self) -> RedbStore {
        let config = RedbConfig::new(&self.file_name, &self.default_bucket, self.cache_size);
        if let Some(dir) = self.db_dir {
            config.set_db_dir(dir);
        }
        RedbStore::new(config)
    }
}
