//! Memory space registry, incremental memory search, and the debug facility.
//!
//! This crate models the address space the console core exposes to the
//! rest of the workspace: a flat registry of named, non-overlapping
//! [`space::Region`]s ([`space`]), an incremental candidate filter over
//! that registry ([`search`]), and address-keyed watchpoints/cheats
//! ([`debug`]).

#![warn(clippy::pedantic)]

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

mod blk;

pub mod debug;
pub mod search;
pub mod space;

pub use blk::Block;

/// Shared, interior-mutable handle to a memory-mapped device.
///
/// Cloning a `Shared` clones the pointer, not the pointee; two clones refer
/// to the same underlying device, which is how a region can be mapped into
/// both the debug facility's watchpoint dispatch and the core's own
/// execution loop.
#[derive(Debug, Default)]
pub struct Shared<T: ?Sized>(Inner<T>);

type Inner<T> = Rc<RefCell<T>>;

impl<T> Shared<T> {
    /// Wraps `value` in a new shared handle.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = Inner<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: ?Sized> DerefMut for Shared<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: ?Sized> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}
