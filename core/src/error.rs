//! The error taxonomy shared across every facade-level operation.

use thiserror::Error;

/// A convenient `Result` alias for [`core`](crate) operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by the emulation core façade or one of its subsystems.
#[derive(Debug, Error)]
pub enum Error {
    /// A movie, screenshot, or config blob failed to decode.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A read or write to storage failed.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
    /// A write was attempted against a read-only region or a read-only
    /// movie.
    #[error("read-only violation")]
    ReadOnlyViolation,
    /// An address or offset fell outside its region or save.
    #[error("out of range")]
    OutOfRange,
    /// A named region no longer exists (its backing VMA was unplugged).
    #[error("stale reference: {0}")]
    StaleReference(String),
    /// The operation isn't permitted in the current coroutine or emulation
    /// state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A scripted callback raised an exception.
    #[error("script error: {0}")]
    ScriptError(String),
    /// The operation was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl From<tascore_arch::space::Error> for Error {
    fn from(err: tascore_arch::space::Error) -> Self {
        match err {
            tascore_arch::space::Error::Range => Error::OutOfRange,
            tascore_arch::space::Error::Readonly => Error::ReadOnlyViolation,
            tascore_arch::space::Error::Busy => Error::InvalidState("device busy".into()),
        }
    }
}

impl From<tascore_wire::Error> for Error {
    fn from(err: tascore_wire::Error) -> Self {
        Error::MalformedInput(err.to_string())
    }
}
