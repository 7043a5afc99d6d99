//! Subcommand dispatch: movie inspection and a headless facade run.
//!
//! The emulated console itself — the thing that actually decodes a
//! cartridge and produces a framebuffer — is a named out-of-scope
//! collaborator; this frontend only has to supply something satisfying
//! [`tascore_core::facade::EmulatedCore`]. For inspection subcommands we
//! never even get that far: they read the `.lsmv` header directly.

use std::fs;

use log::info;
use tascore_core::facade::{AudioSink, DisplaySink, EmulatedCore, Facade};
use tascore_core::input::{ButtonSpec, ControllerType, PortType, PortTypeSet};
use tascore_core::movie::{self, Movie};
use tascore_media::Frame;

use crate::cli::{Cli, Command};
use crate::err::Result;

/// Dispatches `args.cmd` against `args.movie`.
///
/// # Errors
///
/// Propagates I/O failures and malformed-movie errors.
pub fn execute(args: &Cli) -> Result<()> {
    let bytes = fs::read(&args.movie)?;

    match &args.cmd {
        Command::Info => {
            let info = movie::read_brief_info(&bytes)?;
            println!("game:      {}", info.sysregion);
            println!("core:      {}", info.corename);
            println!("project:   {}", info.projectid);
            println!("frame:     {}", info.current_frame);
            println!("rerecords: {}", info.rerecords);
            for name in &info.hinted_names {
                println!("hint:      {name}");
            }
        }
        Command::Branches => {
            for name in movie::list_branches(&bytes)? {
                println!("{name}");
            }
        }
        Command::Sram(sram) => {
            if let Some(name) = &sram.extract {
                let data = movie::extract_sram(&bytes, name)?;
                println!("{} bytes", data.len());
            } else {
                for name in movie::list_srams(&bytes)? {
                    println!("{name}");
                }
            }
        }
        Command::Run(run) => {
            let movie = Movie::decode_binary(&bytes)?;
            execute_run(&movie, run.frames);
        }
    }

    Ok(())
}

fn execute_run(movie: &Movie, frames: u64) {
    info!("loaded movie for {} ({} rerecords)", movie.gametype, movie.rrdata.count());

    // A single-button placeholder controller: the real schema is owned by
    // the console integration this frontend would otherwise load.
    let ports = PortTypeSet::new(vec![PortType {
        name: "1".into(),
        controller: ControllerType::new("placeholder", vec![ButtonSpec::button("A")]),
    }]);

    let mut facade = Facade::new(NullCore, LoggingDisplay::default(), NullAudio, ports);
    for i in 0..frames {
        if let Err(err) = facade.step(&[0], &[0]) {
            log::warn!("frame {i}: {err}");
            break;
        }
    }
    info!("stepped {} frames to index {}", frames, facade.frame_index());
}

/// Stands in for the emulated console: produces a blank framebuffer and
/// reports every step as having polled input.
struct NullCore;

impl EmulatedCore for NullCore {
    fn reset(&mut self) {}

    fn step(&mut self, _input: &[u8]) -> (Vec<u32>, Vec<i16>) {
        (vec![0u32; 160 * 144], Vec::new())
    }

    fn polled(&self) -> bool {
        true
    }

    fn save_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn load_state(&mut self, _bytes: &[u8]) {}
}

#[derive(Default)]
struct LoggingDisplay {
    frames: u64,
}

impl DisplaySink for LoggingDisplay {
    fn present(&mut self, _frame: &Frame<'_>) {
        self.frames += 1;
    }
}

struct NullAudio;

impl AudioSink for NullAudio {
    fn submit(&mut self, _slice: &[i16]) {}
}
