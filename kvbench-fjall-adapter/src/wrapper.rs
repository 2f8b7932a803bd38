use kvbench::errors::{BenchError, ErrorKind};
use std::error::Error;

/// Maps a fjall error onto the benchmark error kinds by its message.
pub(crate) fn to_bench_error(error: impl Error) -> BenchError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") || error_msg.contains("poisoned") {
        ErrorKind::StoreAlreadyClosed
    } else if error_msg.contains("corrupt")
        || error_msg.contains("checksum")
        || error_msg.contains("decompress")
    {
        ErrorKind::DecodeError
    } else if error_msg.contains("Io") || error_msg.contains("I/O") {
        ErrorKind::IOError
    } else {
        ErrorKind::BackendError
    };
    BenchError::new(&format!("Fjall Error: {}", error_msg), error_kind)
}

/// Same as [`to_bench_error`] but for failures while allocating storage.
pub(crate) fn to_init_error(error: impl Error) -> BenchError {
    let cause = to_bench_error(error);
    BenchError::new_with_cause(
        "Failed to open fjall keyspace",
        ErrorKind::InitializationError,
        cause,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::{Display, Formatter};

    #[derive(Debug)]
    struct MessageError(&'static str);

    impl Display for MessageError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for MessageError {}

    #[test]
    fn test_closed_maps_to_store_already_closed() {
        let err = to_bench_error(MessageError("keyspace is closed"));
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
        assert_eq!(err.message(), "Fjall Error: keyspace is closed");
    }

    #[test]
    fn test_corruption_maps_to_decode_error() {
        let err = to_bench_error(MessageError("block checksum mismatch"));
        assert_eq!(err.kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_io_maps_to_io_error() {
        let err = to_bench_error(MessageError("Io(permission denied)"));
        assert_eq!(err.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn test_other_maps_to_backend_error() {
        let err = to_bench_error(MessageError("something odd"));
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }

    #[test]
    fn test_init_error_keeps_cause() {
        let err = to_init_error(MessageError("Io(no space left)"));
        assert_eq!(err.kind(), &ErrorKind::InitializationError);
        assert_eq!(err.cause().map(|c| c.kind()), Some(&ErrorKind::IOError));
    }
}
