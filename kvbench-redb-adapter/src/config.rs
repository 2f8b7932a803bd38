use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Default table used for the root namespace.
pub const DEFAULT_BUCKET: &str = "rand_txns";
/// Name of the database file inside the database directory.
pub const DEFAULT_FILE_NAME: &str = "redb.db";
/// Page cache size in bytes.
pub const DEFAULT_CACHE_SIZE: usize = 64 * 1_024 * 1_024;

#[derive(Clone)]
/// Redb database configuration.
///
/// Clones share the same values. The directory is chosen at most once: either
/// by the builder or, when left unset, by `setup` creating a fresh
/// `redb-<uuid>` temp directory.
pub struct RedbConfig {
    inner: Arc<RedbConfigInner>,
}

impl Default for RedbConfig {
    fn default() -> Self {
        RedbConfig::new(DEFAULT_FILE_NAME, DEFAULT_BUCKET, DEFAULT_CACHE_SIZE)
    }
}

impl RedbConfig {
    pub(crate) fn new(file_name: &str, default_bucket: &str, cache_size: usize) -> RedbConfig {
        RedbConfig {
            inner: Arc::new(RedbConfigInner {
                db_dir: OnceLock::new(),
                file_name: file_name.to_string(),
                default_bucket: default_bucket.to_string(),
                cache_size: AtomicUsize::new(cache_size),
            }),
        }
    }

    #[inline]
    pub fn db_dir(&self) -> Option<PathBuf> {
        self.inner.db_dir.get().cloned()
    }

    #[inline]
    pub(crate) fn set_db_dir(&self, dir: PathBuf) {
        let _ = self.inner.db_dir.set(dir);
    }

    /// Full path of the database file, once the directory is known.
    pub fn db_file(&self) -> Option<PathBuf> {
        self.db_dir().map(|dir| dir.join(&self.inner.file_name))
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    #[inline]
    pub fn default_bucket(&self) -> &str {
        &self.inner.default_bucket
    }

    #[inline]
    pub fn cache_size(&self) -> usize {
        self.inner.cache_size.load(Ordering::Relaxed)
    }
}

struct RedbConfigInner {
    db_dir: OnceLock<PathBuf>,
    file_name: String,
    default_bucket: String,
    cache_size: AtomicUsize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedbConfig::default();
        assert_eq!(config.db_dir(), None);
        assert_eq!(config.db_file(), None);
        assert_eq!(config.file_name(), "redb.db");
        assert_eq!(config.default_bucket(), "rand_txns");
        assert_eq!(config.cache_size(), 64 * 1_024 * 1_024);
    }

    #[test]
    fn test_db_file_joins_dir_and_name() {
        let config = RedbConfig::default();
        config.set_db_dir(PathBuf::from("bench"));
        config.set_db_dir(PathBuf::from("ignored"));
        assert_eq!(config.db_file(), Some(PathBuf::from("bench").join("redb.db")));
    }
}
