//! Fjall backend for kvbench.
//!
//! Runs the benchmark against a single transactional fjall keyspace. All
//! namespaces share one partition and are told apart by an encoded key
//! prefix, so this is the flat counterpart of the bucketed redb backend.
//!
//! ```rust
//! use kvbench::store::BenchStore;
//! use kvbench_fjall_adapter::FjallStore;
//!
//! let store = BenchStore::new(FjallStore::with_config().high_throughput_profile().build());
//! assert!(store.identify().starts_with("fjall-"));
//! ```

mod builder;
mod config;
pub mod prefix;
mod store;
mod transaction;
mod version;
mod wrapper;

pub use builder::*;
pub use config::*;
pub use store::*;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
