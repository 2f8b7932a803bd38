//! Namespace encoding for the flat keyspace.
//!
//! Every namespace owns the keys that start with its prefix. A prefix is the
//! list of segments, each written as a marker byte, a big-endian `u16` length
//! and the segment bytes, closed by an end byte:
//!
//! ```text
//! /          -> 00
//! /a         -> 01 0001 61 00
//! /a/b       -> 01 0001 61 01 0001 62 00
//! ```
//!
//! The end byte differs from the segment marker, so no namespace's prefix is a
//! prefix of another one's and a parent never sees its children's keys.

use kvbench::errors::{BenchError, ErrorKind};
use kvbench::namespace::Namespace;

const SEGMENT_MARKER: u8 = 0x01;
const PATH_END: u8 = 0x00;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("namespace segment of {0} bytes exceeds the limit of 65535 bytes")]
    SegmentTooLong(usize),
}

impl From<PrefixError> for BenchError {
    fn from(err: PrefixError) -> Self {
        BenchError::new(&err.to_string(), ErrorKind::InvalidOperation)
    }
}

pub(crate) fn namespace_prefix(namespace: &Namespace) -> Result<Vec<u8>, PrefixError> {
    let capacity = namespace
        .segments()
        .iter()
        .map(|segment| segment.len() + 3)
        .sum::<usize>()
        + 1;
    let mut prefix = Vec::with_capacity(capacity);

    for segment in namespace.segments() {
        let len = u16::try_from(segment.len())
            .map_err(|_| PrefixError::SegmentTooLong(segment.len()))?;
        prefix.push(SEGMENT_MARKER);
        prefix.extend_from_slice(&len.to_be_bytes());
        prefix.extend_from_slice(segment);
    }
    prefix.push(PATH_END);
    Ok(prefix)
}

#[inline]
pub(crate) fn prefixed_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(prefix.len() + key.len());
    full.extend_from_slice(prefix);
    full.extend_from_slice(key);
    full
}
