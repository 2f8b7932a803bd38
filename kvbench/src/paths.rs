use crate::errors::{BenchError, BenchResult, ErrorKind};
use std::path::{Path, PathBuf};

/// A path `<temp>/<prefix>-<uuid>` that nothing else uses yet.
pub fn random_temp_path(prefix: &str) -> PathBuf {
    let id = uuid::Uuid::new_v4();
    std::env::temp_dir().join(format!("{}-{}", prefix, id))
}

/// Creates a fresh uniquely named directory under the system temp directory.
///
/// Fails with `InitializationError` if the directory cannot be created.
pub fn create_temp_dir(prefix: &str) -> BenchResult<PathBuf> {
    let path = random_temp_path(prefix);
    create_dir(&path)?;
    Ok(path)
}

/// Creates `path` and its parents, reporting failure as `InitializationError`.
pub fn create_dir(path: &Path) -> BenchResult<()> {
    std::fs::create_dir_all(path).map_err(|err| {
        BenchError::new_with_cause(
            &format!("Failed to create directory {}", path.display()),
            ErrorKind::InitializationError,
            err.into(),
        )
    })
}

/// Creates `path` if it is missing. Returns whether this call created it, so
/// the caller knows the directory is its own to remove later.
pub fn claim_dir(path: &Path) -> BenchResult<bool> {
    let existed = path.is_dir();
    create_dir(path)?;
    Ok(!existed)
}

/// Removes a single file. A file that does not exist is not an error.
pub fn remove_file(path: &Path) -> BenchResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            log::error!("Failed to remove {}: {}", path.display(), err);
            Err(err.into())
        }
    }
}

/// Removes `path` recursively. A path that does not exist is not an error.
pub fn remove_dir(path: &Path) -> BenchResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            log::error!("Failed to remove {}: {}", path.display(), err);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_paths_are_unique() {
        let first = random_temp_path("kvbench");
        let second = random_temp_path("kvbench");
        assert_ne!(first, second);
        assert!(first
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("kvbench-")));
    }

    #[test]
    fn test_create_and_remove_dir() {
        let path = create_temp_dir("kvbench-paths").unwrap();
        assert!(path.is_dir());
        std::fs::write(path.join("file"), b"data").unwrap();

        remove_dir(&path).unwrap();
        assert!(!path.exists());
        remove_dir(&path).unwrap();
    }

    #[test]
    fn test_claim_dir_reports_ownership() {
        let parent = create_temp_dir("kvbench-paths").unwrap();
        let child = parent.join("child");

        assert!(claim_dir(&child).unwrap());
        assert!(!claim_dir(&child).unwrap());
        assert!(!claim_dir(&parent).unwrap());
        remove_dir(&parent).unwrap();
    }

    #[test]
    fn test_remove_file_is_idempotent() {
        let parent = create_temp_dir("kvbench-paths").unwrap();
        let file = parent.join("file");
        std::fs::write(&file, b"data").unwrap();

        remove_file(&file).unwrap();
        assert!(!file.exists());
        remove_file(&file).unwrap();
        assert!(parent.is_dir());
        remove_dir(&parent).unwrap();
    }

    #[test]
    fn test_create_dir_fails_under_a_file() {
        let parent = create_temp_dir("kvbench-paths").unwrap();
        let file = parent.join("file");
        std::fs::write(&file, b"data").unwrap();

        let err = create_dir(&file.join("child")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InitializationError);
        remove_dir(&parent).unwrap();
    }
}
