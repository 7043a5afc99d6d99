//! Application configuration.

use std::io::ErrorKind::NotFound;
use std::path::{Path, PathBuf};
use std::{fs, io};

pub use tascore_cfg::Config;
use tascore_cfg::Conf as _;
use thiserror::Error;

use crate::dir;

/// Returns the path to the application's configuration file.
#[must_use]
pub fn path() -> PathBuf {
    dir::config().join("config.toml")
}

/// Loads configuration data from a file, rebasing relative paths it
/// contains against the file's own directory.
///
/// # Errors
///
/// This function will return an error if the configuration could not be
/// loaded.
pub fn load(path: &Path) -> Result<Config> {
    let body = match fs::read_to_string(path) {
        // If the configuration file does not exist, fall back to an empty
        // document, resulting in all fields being populated with defaults.
        Err(err) if err.kind() == NotFound => String::new(),
        Err(err) => return Err(err.into()),
        Ok(body) => body,
    };
    let mut cfg: Config = toml::from_str(&body)?;
    if let Some(root) = path.parent() {
        cfg.rebase(root);
    }
    Ok(cfg)
}

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error caused by [loading](load) the configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading error.
    #[error("reading configuration failed")]
    Read(#[from] io::Error),
    /// Parsing error.
    #[error("parsing configuration failed")]
    Parse(#[from] toml::de::Error),
}
