//! # TAS Core
//!
//! This library implements the movie/branch engine, controller frame
//! codec, rerecord counter, emulation façade, and project store shared by
//! a rerecording console-emulator frontend.

pub mod error;
pub mod facade;
pub mod input;
pub mod movie;
pub mod project;
pub mod rrd;

pub use error::{Error, Result};
pub use facade::{AudioSink, ButtonKey, ButtonOverride, DisplaySink, EmulatedCore, Facade, FrameAdvanceMode};
pub use input::{ButtonKind, ButtonSpec, ControllerType, FrameVector, PortType, PortTypeSet};
pub use movie::{BriefInfo, DynamicState, Movie, TextMembers};
pub use project::{ProjectLayout, RecentList, RomEntry, RomRef};
pub use rrd::RrdSet;
