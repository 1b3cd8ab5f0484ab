//! Errors.

use std::io;

/// Infrastructure and protocol failures that cross a worker boundary.
///
/// Query-control values (`no_query`, `time_limit_exceeded`, engine
/// exceptions, ...) are *not* represented here: per spec.md §7 they are
/// normal reply values, produced as [`crate::wire::reply`] frames, never
/// as `Err(Error)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("goal worker for connection {0} crashed or disconnected unexpectedly")]
    WorkerCrashed(String),

    #[error("local socket path must be absolute: {0}")]
    RelativeSocketPath(String),

    #[error("invalid configuration: {0}")]
    BadConfig(String),
}

/// Frame-decoding failures, spec.md §4.1.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame length prefix was not a valid decimal integer")]
    BadLength,
    #[error("frame length prefix was not terminated by a newline")]
    MissingLengthNewline,
    #[error("frame payload did not end with the required `.\\n` terminator")]
    MissingPayloadTerminator,
    #[error("connection closed before a complete frame was received")]
    ConnectionClosed,
}
