use anyhow::Error;
use std::io;

use super::error::HexSgeError;

/// Returns `true` if the error originated from a broken pipe.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    let root = err.root_cause();
    if let Some(io_err) = root.downcast_ref::<io::Error>() {
        return io_err.kind() == io::ErrorKind::BrokenPipe;
    }
    matches!(
        root.downcast_ref::<HexSgeError>(),
        Some(HexSgeError::Io(io_err)) if io_err.kind() == io::ErrorKind::BrokenPipe
    )
}
