use kvbench::version::dependency_version;

#[inline]
pub(crate) fn redb_version() -> Result<String, String> {
    dependency_version(include_str!("../Cargo.toml"), "redb")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redb_version_from_own_manifest() {
        assert_eq!(redb_version(), Ok("3.1".to_string()));
    }
}
