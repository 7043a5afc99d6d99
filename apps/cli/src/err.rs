//! Error types.

use std::error::Error as StdError;
use std::process::{ExitCode, Termination};

use thiserror::Error;

use crate::cfg;

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A top-level error from within the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Application error.
    #[error(transparent)]
    App(#[from] anyhow::Error),
    /// Configuration error.
    #[error(transparent)]
    Cfg(#[from] cfg::Error),
    /// Core library error.
    #[error(transparent)]
    Core(#[from] tascore_core::Error),
}

impl Error {
    /// Prints this error and its full cause chain to the user.
    fn advise(&self) {
        // Report top-level error
        tell::error!("{}", format!("{self}").trim_end());
        let Some(mut err) = self.source() else {
            return;
        };
        // Report intermediate errors
        while let Some(src) = err.source() {
            tell::warn!("{}", format!("{err}").trim_end());
            err = src;
        }
        // Report bottom-level error
        tell::debug!("{}", format!("{err}").trim_end());
    }
}

impl From<Error> for ExitCode {
    fn from(err: Error) -> Self {
        match err {
            Error::App(_) | Error::Core(_) => ExitCode::FAILURE,
            Error::Cfg(_) => ExitCode::from(78), // EX_CONFIG, per sysexits(3)
        }
    }
}

/// Application exit condition.
///
/// In the [`Termination`] implementation for `Exit`, we print any errors that
/// occur for the user.
#[derive(Debug)]
pub enum Exit {
    /// Exit success.
    Success,
    /// Exit failure.
    ///
    /// Advises the user about the [error](enum@Error), returning a non-zero
    /// [exit code](ExitCode).
    Failure(Error),
}

impl<E: Into<Error>> From<E> for Exit {
    fn from(err: E) -> Self {
        Self::Failure(err.into())
    }
}

impl Termination for Exit {
    fn report(self) -> ExitCode {
        match self {
            Exit::Success => {
                // Return a success exit code
                ExitCode::SUCCESS
            }
            Exit::Failure(err) => {
                // Advise the user about the error
                err.advise();
                // Return a failure exit code
                err.into()
            }
        }
    }
}
