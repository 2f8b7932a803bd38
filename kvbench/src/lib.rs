//! # kvbench - Embedded Key-Value Engine Benchmarks
//!
//! kvbench drives structurally different embedded key-value engines through one
//! transactional contract and measures how they cope with large synthetic
//! workloads.
//!
//! ## Key Features
//!
//! - **Uniform Store Contract**: the same driver runs against hierarchical
//!   (bucketed) and flat (prefixed) engines without knowing which is which
//! - **Reproducible Workloads**: random fixed-size keys and equal-size values,
//!   from OS entropy or a seeded generator
//! - **Verified Batches**: every batch checks that deleted keys are gone,
//!   retained keys read back byte for byte and iteration yields real entries
//! - **Measurements**: a named stopwatch registry and a memory profiler that
//!   can sample in the background
//!
//! ## Quick Start
//!
//! ```rust
//! use kvbench::driver::BenchmarkDriver;
//! use kvbench::namespace::Namespace;
//! use kvbench::store::memory::InMemoryStore;
//! use kvbench::store::BenchStore;
//! use kvbench::workload::WorkloadConfig;
//!
//! # fn main() -> kvbench::errors::BenchResult<()> {
//! let store = BenchStore::new(InMemoryStore::new());
//! store.setup()?;
//!
//! let mut driver = BenchmarkDriver::new(
//!     store.clone(),
//!     Namespace::named(b"TestBucket"),
//!     WorkloadConfig::quick(),
//! )?;
//! let report = driver.run()?;
//! assert_eq!(report.batches.len(), 5);
//!
//! store.close()?;
//! store.cleanup()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`driver`] - Batch state machine and run reports
//! - [`errors`] - Error types and result definitions
//! - [`key`] - Fixed-length benchmark keys
//! - [`namespace`] - Backend sub-scopes
//! - [`paths`] - Temporary storage directories
//! - [`profiler`] - Memory statistics
//! - [`store`] - Storage contract and the in-memory store
//! - [`timer`] - Named stopwatches
//! - [`version`] - Engine versions from adapter manifests
//! - [`workload`] - Workload configuration and batch generation

pub mod driver;
pub mod errors;
pub mod key;
pub mod namespace;
pub mod paths;
pub mod profiler;
pub mod store;
pub mod timer;
pub mod version;
pub mod workload;
