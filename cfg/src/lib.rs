//! Frontend configuration: CLI flags, environment variables, and an
//! on-disk TOML file, merged in that priority order.

use std::path::Path;

use crate::opt::{Application, Emulation};

mod val;

pub mod env;
pub mod opt;

pub use val::{FrameAdvanceMode, RerecordMode};

/// Configuration interface shared by every option group.
pub trait Conf {
    /// Rebases relative paths against `root` (the config file's own
    /// directory, so a `rom = "foo.rom"` entry resolves next to the file
    /// that named it rather than the process's working directory).
    fn rebase(&mut self, root: &Path);

    /// Combines two configuration instances, preferring `self`'s values
    /// over `other`'s on a field-by-field basis.
    ///
    /// Callers merge in priority order: `cli.merge(env); cli.merge(file)`,
    /// so that a CLI flag always wins over an environment variable, which
    /// always wins over the file.
    fn merge(&mut self, other: Self);
}

/// Top-level configuration.
#[derive(Debug, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct Config {
    /// Application options.
    #[cfg_attr(feature = "clap", clap(flatten))]
    pub app: Application,

    /// Emulation options.
    #[cfg_attr(feature = "clap", clap(flatten))]
    pub emu: Emulation,
}

impl Conf for Config {
    fn rebase(&mut self, root: &Path) {
        self.app.rebase(root);
        self.emu.rebase(root);
    }

    fn merge(&mut self, other: Self) {
        self.app.merge(other.app);
        self.emu.merge(other.emu);
    }
}

#[cfg(all(test, feature = "toml"))]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.app.log.is_none());
    }

    #[test]
    fn merge_prefers_self() {
        let mut cli = Config {
            app: Application { log: Some("cli".into()), ..Default::default() },
            ..Default::default()
        };
        let file = Config {
            app: Application { log: Some("file".into()), ..Default::default() },
            ..Default::default()
        };
        cli.merge(file);
        assert_eq!(cli.app.log.as_deref(), Some("cli"));
    }
}
