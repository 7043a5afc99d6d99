//! Emulation/movie-recording options.

use std::path::Path;

use crate::val::{FrameAdvanceMode, RerecordMode};
use crate::Conf;

/// Emulation options: movie-recording behavior that applies regardless of
/// which console core is loaded.
#[derive(Debug, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct Emulation {
    /// Startup frame-advance mode.
    #[cfg_attr(feature = "clap", clap(long, value_name = "MODE", value_enum))]
    pub mode: Option<FrameAdvanceMode>,

    /// Rerecord counting behavior.
    #[cfg_attr(feature = "clap", clap(long, value_name = "MODE", value_enum))]
    pub rerecord: Option<RerecordMode>,

    /// Autofire toggle period, in frames.
    #[cfg_attr(feature = "clap", clap(long, value_name = "FRAMES"))]
    pub autofire_rate: Option<u32>,
}

impl Conf for Emulation {
    fn rebase(&mut self, _root: &Path) {}

    fn merge(&mut self, other: Self) {
        self.mode = self.mode.take().or(other.mode);
        self.rerecord = self.rerecord.take().or(other.rerecord);
        self.autofire_rate = self.autofire_rate.take().or(other.autofire_rate);
    }
}
