use crate::errors::BenchResult;
use crate::key::{Key, KEY_LENGTH};
use crate::workload::WorkloadConfig;
use indexmap::IndexMap;
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};

/// Reference copy of one generated batch.
///
/// Entries keep the order in which their keys were first drawn. A key drawn
/// twice keeps its first position and the later value.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    entries: IndexMap<Key, Vec<u8>>,
    value_length: usize,
}

/// Keys chosen for the delete and read-back phases of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub removed: Vec<Key>,
    pub retrieved: Vec<Key>,
}

impl Batch {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn value_length(&self) -> usize {
        self.value_length
    }

    pub fn get(&self, key: &Key) -> Option<&[u8]> {
        self.entries.get(key).map(|value| value.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[u8])> {
        self.entries.iter().map(|(key, value)| (key, value.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    /// Sum of all value lengths.
    pub fn value_bytes(&self) -> usize {
        self.entries.values().map(|value| value.len()).sum()
    }

    /// Splits the batch into the first `removed` keys and the `retrieved`
    /// keys after them. Either subset is truncated when the batch runs out.
    pub fn partition(&self, removed: usize, retrieved: usize) -> Partition {
        let mut keys = self.entries.keys().copied();
        let removed: Vec<Key> = keys.by_ref().take(removed).collect();
        let retrieved: Vec<Key> = keys.take(retrieved).collect();
        Partition { removed, retrieved }
    }
}

/// Draws batches of random keys and values.
///
/// The source must be cryptographically secure. [`WorkloadGenerator::new`]
/// reads the OS entropy source, so two runs select different keys;
/// [`WorkloadGenerator::seeded`] replays the same batches for the same seed.
pub struct WorkloadGenerator<R: RngCore + CryptoRng = OsRng> {
    rng: R,
    items: usize,
    value_length: usize,
}

impl WorkloadGenerator<OsRng> {
    pub fn new(config: &WorkloadConfig) -> Self {
        WorkloadGenerator::with_rng(config, OsRng)
    }
}

impl WorkloadGenerator<StdRng> {
    pub fn seeded(config: &WorkloadConfig, seed: u64) -> Self {
        WorkloadGenerator::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + CryptoRng> WorkloadGenerator<R> {
    pub fn with_rng(config: &WorkloadConfig, rng: R) -> Self {
        WorkloadGenerator {
            rng,
            items: config.batch_size_items,
            value_length: config.value_length(),
        }
    }

    /// Generates a fresh batch.
    ///
    /// Fails with `RandomSourceError` as soon as the source cannot deliver
    /// bytes; nothing is retried.
    pub fn generate(&mut self) -> BenchResult<Batch> {
        let mut entries = IndexMap::with_capacity(self.items);
        for _ in 0..self.items {
            let key = Key::from_slice(&self.random_bytes(KEY_LENGTH)?)?;
            let value = self.random_bytes(self.value_length)?;
            entries.insert(key, value);
        }

        if entries.len() < self.items {
            log::debug!(
                "Batch generated {} duplicate keys",
                self.items - entries.len()
            );
        }

        Ok(Batch {
            entries,
            value_length: self.value_length,
        })
    }

    pub fn random_bytes(&mut self, len: usize) -> BenchResult<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        self.rng.try_fill_bytes(&mut bytes)?;
        Ok(bytes)
    }
}
