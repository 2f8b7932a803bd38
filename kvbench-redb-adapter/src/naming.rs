//! Table names for namespaces.
//!
//! Every namespace is one redb table. The root namespace uses the configured
//! default bucket. Any other path is rendered as `/segment/segment...`, which
//! cannot collide with a default bucket name that does not start with `/`.
//! Segments that are not valid UTF-8, contain `/`, or already look like a hex
//! literal are written as `0x` followed by their lowercase hex bytes.

use kvbench::namespace::Namespace;
use std::fmt::Write;

pub(crate) fn table_name(namespace: &Namespace, default_bucket: &str) -> String {
    if namespace.is_root() {
        return default_bucket.to_string();
    }

    let mut name = String::new();
    for segment in namespace.segments() {
        name.push('/');
        match std::str::from_utf8(segment) {
            Ok(text) if !text.contains('/') && !text.starts_with("0x") => name.push_str(text),
            _ => {
                name.push_str("0x");
                for byte in segment {
                    let _ = write!(name, "{:02x}", byte);
                }
            }
        }
    }
    name
}
