//! Redb backend for kvbench.
//!
//! Maps every namespace to its own redb table, the bucketed counterpart of
//! the flat fjall backend. Cursors are positioned explicitly with `first()`.

mod builder;
mod config;
mod naming;
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
