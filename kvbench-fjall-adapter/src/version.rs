use kvbench::version::dependency_version;

/// Version requirement of the `fjall` dependency, read from this crate's
/// manifest at compile time.
#[inline]
pub(crate) fn fjall_version() -> Result<String, String> {
    dependency_version(include_str!("../Cargo.toml"), "fjall")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fjall_version_from_own_manifest() {
        assert_eq!(fjall_version(), Ok("2.6.3".to_string()));
    }
}
