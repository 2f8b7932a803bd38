//! kvbench Integration Harness
//!
//! Store factories and test helpers shared by the experiment runner, the
//! integration tests and the criterion benches. Linking this crate installs
//! the tracking allocator, so every binary built on it reports real heap
//! numbers from the profiler.

use kvbench::profiler::TrackingAllocator;

#[global_allocator]
static ALLOCATOR: TrackingAllocator = TrackingAllocator;

pub mod stores;
pub mod test_util;
