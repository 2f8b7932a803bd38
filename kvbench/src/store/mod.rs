//! Storage contract shared by every backend.
//!
//! The benchmark driver only ever talks to a [`BenchStore`]. Each backend
//! implements [`BenchStoreProvider`], hands out [`BenchTransaction`]s for the
//! duration of one `update`/`view` call and [`BenchIterator`]s bound to one
//! transaction. Namespace handling stays inside the provider.
//!
//! # Backends
//!
//! - **In-Memory Store**: [`memory::InMemoryStore`], the reference
//!   implementation used by unit tests
//! - **Redb Store**: `kvbench-redb-adapter`, hierarchical buckets with cursors
//! - **Fjall Store**: `kvbench-fjall-adapter`, flat keyspace with prefix seeks

mod bench_store;
pub mod memory;
mod transaction;

pub use bench_store::*;
pub use transaction::*;
