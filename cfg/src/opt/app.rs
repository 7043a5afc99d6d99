//! Application-level options.

use std::path::{Path, PathBuf};

use crate::Conf;

/// Application options: logging and storage location, independent of any
/// particular movie or emulated console.
#[derive(Debug, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct Application {
    /// Logging filter.
    ///
    /// A comma-separated list of logging directives.
    #[cfg_attr(feature = "clap", clap(
        short, long,
        env = crate::env::LOG,
        value_name = "FILTER",
    ))]
    pub log: Option<String>,

    /// Project/branch store directory.
    ///
    /// Defaults to the platform data directory if unset.
    #[cfg_attr(feature = "clap", clap(
        long,
        env = crate::env::DATA_DIR,
        value_name = "PATH",
        value_hint = clap::ValueHint::DirPath,
    ))]
    pub data_dir: Option<PathBuf>,
}

impl Conf for Application {
    fn rebase(&mut self, root: &Path) {
        self.data_dir = self.data_dir.take().map(|path| root.join(path));
    }

    fn merge(&mut self, other: Self) {
        self.log = self.log.take().or(other.log);
        self.data_dir = self.data_dir.take().or(other.data_dir);
    }
}
