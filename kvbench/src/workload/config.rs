//! Workload configuration

use crate::errors::{BenchError, ErrorKind};

/// Reasons a [`WorkloadConfig`] cannot drive a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("number of batches must be at least 1")]
    NoBatches,
    #[error("batch size in items must be at least 1")]
    NoItems,
    #[error("batch of {bytes} bytes cannot hold {items} items of at least one byte")]
    BatchTooSmall { bytes: usize, items: usize },
    #[error("{removed} removed plus {retrieved} retrieved items exceed the batch of {items}")]
    SubsetTooLarge {
        removed: usize,
        retrieved: usize,
        items: usize,
    },
    #[error("{batches} batches of {items} items of {value_length} bytes overflow a usize")]
    TotalTooLarge {
        batches: usize,
        items: usize,
        value_length: usize,
    },
}

impl From<ConfigError> for BenchError {
    fn from(err: ConfigError) -> Self {
        BenchError::new(
            &format!("Invalid workload configuration: {}", err),
            ErrorKind::InvalidConfig,
        )
    }
}

/// Shape of one benchmark run.
///
/// Every batch writes `batch_size_items` values of
/// `batch_size_bytes / batch_size_items` bytes, deletes `items_removed` of them,
/// reads back `items_retrieved` others and iterates at most `items_iterated`
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub number_of_batches: usize,
    pub batch_size_bytes: usize,
    pub batch_size_items: usize,
    pub items_removed: usize,
    pub items_retrieved: usize,
    pub items_iterated: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig::experiment_10mb_batch()
    }
}

impl WorkloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5 GB written in 500 batches of 100 items, 10 MB each.
    pub fn experiment_10mb_batch() -> Self {
        Self {
            number_of_batches: 500,
            batch_size_bytes: 10_000_000,
            batch_size_items: 100,
            items_removed: 20,
            items_retrieved: 20,
            items_iterated: 20,
        }
    }

    /// 5 GB written in 200 batches of 250 items, 25 MB each.
    pub fn experiment_25mb_batch() -> Self {
        Self {
            number_of_batches: 200,
            batch_size_bytes: 25_000_000,
            batch_size_items: 250,
            ..Self::experiment_10mb_batch()
        }
    }

    /// 5 GB written in 50 batches of 1000 items, 100 MB each.
    pub fn experiment_100mb_batch() -> Self {
        Self {
            number_of_batches: 50,
            batch_size_bytes: 100_000_000,
            batch_size_items: 1000,
            ..Self::experiment_10mb_batch()
        }
    }

    /// Quick config with small batches for fast testing
    pub fn quick() -> Self {
        Self {
            number_of_batches: 5,
            batch_size_bytes: 100_000,
            batch_size_items: 100,
            items_removed: 20,
            items_retrieved: 20,
            items_iterated: 20,
        }
    }

    pub fn number_of_batches(mut self, batches: usize) -> Self {
        self.number_of_batches = batches;
        self
    }

    pub fn batch_size_bytes(mut self, bytes: usize) -> Self {
        self.batch_size_bytes = bytes;
        self
    }

    pub fn batch_size_items(mut self, items: usize) -> Self {
        self.batch_size_items = items;
        self
    }

    pub fn items_removed(mut self, items: usize) -> Self {
        self.items_removed = items;
        self
    }

    pub fn items_retrieved(mut self, items: usize) -> Self {
        self.items_retrieved = items;
        self
    }

    pub fn items_iterated(mut self, items: usize) -> Self {
        self.items_iterated = items;
        self
    }

    /// Length of every value in a batch. Integer division, the remainder of
    /// `batch_size_bytes` is never written.
    #[inline]
    pub fn value_length(&self) -> usize {
        if self.batch_size_items == 0 {
            return 0;
        }
        self.batch_size_bytes / self.batch_size_items
    }

    /// Bytes written over the whole run, keys excluded. `None` when the
    /// total does not fit in a usize.
    pub fn total_bytes(&self) -> Option<usize> {
        self.number_of_batches
            .checked_mul(self.batch_size_items)?
            .checked_mul(self.value_length())
    }

    /// Progress is logged every this many batches.
    pub fn log_interval(&self) -> usize {
        (self.number_of_batches / 50).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_batches == 0 {
            return Err(ConfigError::NoBatches);
        }
        if self.batch_size_items == 0 {
            return Err(ConfigError::NoItems);
        }
        if self.value_length() == 0 {
            return Err(ConfigError::BatchTooSmall {
                bytes: self.batch_size_bytes,
                items: self.batch_size_items,
            });
        }
        let subset = self.items_removed.checked_add(self.items_retrieved);
        if subset.map_or(true, |subset| subset > self.batch_size_items) {
            return Err(ConfigError::SubsetTooLarge {
                removed: self.items_removed,
                retrieved: self.items_retrieved,
                items: self.batch_size_items,
            });
        }
        if self.total_bytes().is_none() {
            return Err(ConfigError::TotalTooLarge {
                batches: self.number_of_batches,
                items: self.batch_size_items,
                value_length: self.value_length(),
            });
        }
        Ok(())
    }
}
