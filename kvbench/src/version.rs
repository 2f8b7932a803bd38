use cargo_toml::{Dependency, Manifest};

/// Version requirement of dependency `name` in the manifest text `cargo_toml`.
///
/// Adapters pass their own manifest through `include_str!` so that
/// `identify()` reports the engine version they were built against.
///
/// ```rust
/// use kvbench::version::dependency_version;
///
/// let manifest = "[package]\nname = \"a\"\nversion = \"0.1.0\"\n[dependencies]\nredb = \"3.1\"\n";
/// assert_eq!(dependency_version(manifest, "redb"), Ok("3.1".to_string()));
/// ```
pub fn dependency_version(cargo_toml: &str, name: &str) -> Result<String, String> {
    let manifest = Manifest::from_str(cargo_toml)
        .map_err(|e| format!("Failed to parse Cargo.toml: {}", e))?;

    let dependency = manifest
        .dependencies
        .get(name)
        .ok_or_else(|| format!("{} dependency not found in Cargo.toml", name))?;

    match dependency {
        Dependency::Simple(version) => Ok(version.clone()),
        Dependency::Detailed(d) => d
            .version
            .as_ref()
            .cloned()
            .ok_or_else(|| format!("{} dependency version not specified", name)),
        Dependency::Inherited(_) => Err(format!("Inherited {} dependency not supported", name)),
    }
}
