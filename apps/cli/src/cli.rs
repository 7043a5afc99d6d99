//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};
use tascore_cfg::Config;

use crate::def::NAME;

/// Drive a rerecording console-emulator movie from the command line.
///
/// Loads a `.lsmv` movie, and either inspects it (header, branches, SRAM
/// slots) or steps it headlessly through the emulation facade.
#[derive(Debug, Parser)]
#[clap(name = NAME, author, version, about, long_about)]
pub struct Cli {
    /// Configuration file.
    ///
    /// When options are specified in multiple locations, they will be
    /// applied with the following precedence: cli > env > file.
    #[clap(long, value_name = "PATH")]
    #[clap(default_value_os_t = crate::cfg::path())]
    #[clap(value_hint = ValueHint::FilePath)]
    pub conf: PathBuf,

    /// Configuration data.
    #[clap(flatten)]
    #[clap(next_help_heading = None)]
    pub cfg: Config,

    /// Movie file to operate on.
    #[clap(value_name = "MOVIE")]
    #[clap(value_hint = ValueHint::FilePath)]
    pub movie: PathBuf,

    #[clap(subcommand)]
    pub cmd: Command,
}

/// Subcommands operating on the loaded movie.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print header information without decoding branch frame data.
    Info,
    /// List every branch name present.
    Branches,
    /// Operate on SRAM slots embedded in the movie.
    Sram(SramArgs),
    /// Step the movie headlessly through the emulation facade.
    Run(RunArgs),
}

/// SRAM-slot subcommand arguments.
#[derive(Args, Debug)]
pub struct SramArgs {
    /// Name of the slot to extract instead of listing all slots.
    #[clap(long, value_name = "NAME")]
    pub extract: Option<String>,
}

/// Headless-run subcommand arguments.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of frames to step before exiting.
    #[clap(long, value_name = "COUNT", default_value_t = 60)]
    pub frames: u64,
}
