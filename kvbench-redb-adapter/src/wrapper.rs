use kvbench::errors::{BenchError, ErrorKind};
use std::error::Error;

/// Maps a redb error onto the benchmark error kinds by its message.
pub(crate) fn to_bench_error(error: impl Error) -> BenchError {
    let error_msg = error.to_string();
    let lower = error_msg.to_lowercase();
    let error_kind = if lower.contains("corrupt") || lower.contains("checksum") {
        ErrorKind::DecodeError
    } else if lower.contains("i/o") || lower.contains("io error") {
        ErrorKind::IOError
    } else if lower.contains("already open") || lower.contains("upgrade required") {
        ErrorKind::InitializationError
    } else {
        ErrorKind::BackendError
    };
    BenchError::new(&format!("Redb Error: {}", error_msg), error_kind)
}

pub(crate) fn to_init_error(error: impl Error) -> BenchError {
    let cause = to_bench_error(error);
    BenchError::new_with_cause(
        "Failed to open redb database",
        ErrorKind::InitializationError,
        cause,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_io_maps_to_io_error() {
        let io = std::io::Error::other("no space left");
        let err = to_bench_error(redb::StorageError::Io(io));
        assert_eq!(err.kind(), &ErrorKind::IOError);
        assert!(err.message().starts_with("Redb Error: "));
    }

    #[test]
    fn test_corruption_maps_to_decode_error() {
        let err = to_bench_error(redb::StorageError::Corrupted("bad page".to_string()));
        assert_eq!(err.kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_database_in_use_maps_to_initialization_error() {
        let err = to_init_error(redb::DatabaseError::DatabaseAlreadyOpen);
        assert_eq!(err.kind(), &ErrorKind::InitializationError);
        assert_eq!(
            err.cause().map(|c| c.kind()),
            Some(&ErrorKind::InitializationError)
        );
    }

    #[test]
    fn test_other_maps_to_backend_error() {
        let err = to_bench_error(redb::TableError::TableDoesNotExist("t".to_string()));
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }
}
