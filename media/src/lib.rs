//! Framebuffers, the retained render queue, and the bitmap font renderer.
//!
//! This crate owns everything between the console core's raw pixel output
//! and a caller-provided display surface: premultiplied-alpha blending
//! ([`color`]), frame storage and resizing ([`frame`]), the script-facing
//! retained render queue ([`queue`]), and bitmap text ([`font`]).

#![warn(clippy::pedantic)]

pub mod color;
pub mod font;
pub mod frame;
pub mod queue;

pub use color::Premultiplied;
pub use frame::Frame;
pub use queue::{Object, Queue};
