//! The scripting bridge: a language-neutral surface an embedded
//! interpreter binds against, without this crate ever naming which
//! interpreter that is.
//!
//! [`value::Value`] is the boundary representation; [`params::Cursor`]
//! reads a callback's arguments off it; [`objpin::ObjPin`] keeps a native
//! object alive across interpreter yields; [`group::State`] owns the
//! registration of [`group::FunctionGroup`]s and [`group::ClassGroup`]s an
//! embedder attaches; [`bitlib`] and [`draw`] are the two concrete binding
//! families this crate ships pre-built.

#![warn(clippy::pedantic)]

pub mod bitlib;
pub mod draw;
pub mod group;
pub mod memory;
pub mod objpin;
pub mod params;
pub mod value;

pub use group::{ClassBase, ClassGroup, Error as DispatchError, FunctionGroup, State};
pub use objpin::{ObjPin, PinId};
pub use params::{Color, Cursor, Error as ParamError, FromValue};
pub use value::Value;
