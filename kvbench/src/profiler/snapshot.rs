use std::fmt::{Display, Formatter};
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

#[inline]
pub(crate) fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / MIB
}

/// One memory measurement.
///
/// Rust has no collector, so the reclaim counter is the number of heap frees
/// seen by the tracking allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Time since the profiler was created.
    pub offset: Duration,
    /// Live heap bytes.
    pub alloc_bytes: u64,
    /// Cumulative heap bytes allocated.
    pub total_alloc_bytes: u64,
    /// Resident memory of the process as reported by the OS.
    pub sys_bytes: u64,
    /// Heap blocks released.
    pub num_free: u64,
}

impl Display for MemorySnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Alloc = {} MiB\tTotalAlloc = {} MiB\tSys = {} MiB\tNumFree = {}",
            bytes_to_mib(self.alloc_bytes),
            bytes_to_mib(self.total_alloc_bytes),
            bytes_to_mib(self.sys_bytes),
            self.num_free
        )
    }
}

/// Mean and maximum of one metric across a series of snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub max: u64,
}

impl MetricSummary {
    fn from_values(values: impl Iterator<Item = u64>) -> MetricSummary {
        let mut count = 0u64;
        let mut sum = 0f64;
        let mut max = 0u64;
        for value in values {
            count += 1;
            sum += value as f64;
            max = max.max(value);
        }
        if count == 0 {
            return MetricSummary::default();
        }
        MetricSummary {
            mean: sum / count as f64,
            max,
        }
    }
}

/// Summary statistics over every snapshot a profiler recorded.
///
/// An empty series reports zero for every metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfilerStats {
    pub samples: usize,
    pub alloc: MetricSummary,
    pub total_alloc: MetricSummary,
    pub sys: MetricSummary,
    pub num_free: MetricSummary,
}

impl ProfilerStats {
    pub fn from_snapshots(snapshots: &[MemorySnapshot]) -> ProfilerStats {
        ProfilerStats {
            samples: snapshots.len(),
            alloc: MetricSummary::from_values(snapshots.iter().map(|s| s.alloc_bytes)),
            total_alloc: MetricSummary::from_values(
                snapshots.iter().map(|s| s.total_alloc_bytes),
            ),
            sys: MetricSummary::from_values(snapshots.iter().map(|s| s.sys_bytes)),
            num_free: MetricSummary::from_values(snapshots.iter().map(|s| s.num_free)),
        }
    }
}

impl Display for ProfilerStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mib = MIB as f64;
        writeln!(f, "Samples = {}", self.samples)?;
        writeln!(f, "Metric\tMean\tMax")?;
        writeln!(
            f,
            "Alloc\t{:.2} MiB\t{} MiB",
            self.alloc.mean / mib,
            bytes_to_mib(self.alloc.max)
        )?;
        writeln!(
            f,
            "TotalAlloc\t{:.2} MiB\t{} MiB",
            self.total_alloc.mean / mib,
            bytes_to_mib(self.total_alloc.max)
        )?;
        writeln!(
            f,
            "Sys\t{:.2} MiB\t{} MiB",
            self.sys.mean / mib,
            bytes_to_mib(self.sys.max)
        )?;
        write!(f, "NumFree\t{:.2}\t{}", self.num_free.mean, self.num_free.max)
    }
}
