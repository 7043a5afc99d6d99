#![warn(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;
use log::trace;
use tascore_cfg::Conf as _;

use crate::cli::Cli;
use crate::err::{Exit, Result};

mod cfg;
mod cli;
mod def;
mod dir;
mod err;
mod exec;

fn main() -> Exit {
    match run() {
        Ok(()) => Exit::Success,
        Err(e) => Exit::Failure(e),
    }
}

fn run() -> Result<()> {
    // Parse args
    let mut args = Cli::parse();
    // Load config, letting cli-supplied values win over the file's
    let file = cfg::load(&args.conf).context("could not load configuration")?;
    args.cfg.merge(file);
    // Initialize logger
    setup::log(args.cfg.app.log.as_deref().unwrap_or("warn"));
    // Log previous steps
    trace!("{args:#?}");

    // Load movie and execute subcommand
    exec::execute(&args)
}

mod setup {
    /// Installs an `env_logger` backend for the [`log`] facade, filtered by
    /// `filter` (an `env_logger`-syntax directive string).
    pub fn log(filter: &str) {
        env_logger::Builder::new().parse_filters(filter).init();
    }
}
