//! Configurable value enums.

/// How the rerecord counter advances on loading a savestate.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum RerecordMode {
    /// Increment on every load, the conventional TAS-tool behavior.
    #[default]
    Increment,
    /// Never increment; useful for read-only movie playback.
    Preserve,
}

/// The façade's frame-advance state on startup.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum FrameAdvanceMode {
    /// Run continuously.
    #[default]
    FreeRun,
    /// Step exactly one frame, then pause.
    AdvanceFrame,
    /// Step until the next input poll, then pause.
    AdvanceSubframe,
    /// Don't run at all.
    Pause,
}
