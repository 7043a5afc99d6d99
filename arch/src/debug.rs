//! Debug facility: address-keyed watchpoints and cheats.
//!
//! The callback surface here is intentionally bare — a boxed closure keyed
//! by address — because the scripting bridge is what gives a callback
//! meaning (an `objpin` into a script-side function). This crate only
//! owns dispatch and the cheat substitution table.

use std::collections::HashMap;
use std::fmt;

/// A registered watchpoint callback.
///
/// Receives the address that triggered it and the value involved (for
/// writes, the value being written; for reads, the value about to be
/// returned; unused for execute watchpoints, passed as `0`).
pub type Callback = Box<dyn FnMut(u64, u64)>;

/// Which kind of access a watchpoint fires on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Read,
    Write,
    Execute,
}

/// Address-keyed watchpoint registries, plus the cheat substitution table.
#[derive(Default)]
pub struct Debugger {
    watch: HashMap<Kind, HashMap<u64, Vec<Callback>>>,
    cheats: HashMap<u64, u8>,
}

impl fmt::Debug for Debugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debugger")
            .field("watch_counts", &self.watch.iter().map(|(k, v)| (*k, v.len())).collect::<Vec<_>>())
            .field("cheats", &self.cheats)
            .finish()
    }
}

impl Debugger {
    /// Constructs an empty debugger with no watchpoints or cheats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` to fire on every `kind` access to `addr`.
    pub fn add_watchpoint(&mut self, kind: Kind, addr: u64, callback: Callback) {
        self.watch.entry(kind).or_default().entry(addr).or_default().push(callback);
    }

    /// Removes every watchpoint registered for `(kind, addr)`.
    ///
    /// Returns the number of callbacks removed.
    pub fn clear_watchpoint(&mut self, kind: Kind, addr: u64) -> usize {
        self.watch
            .get_mut(&kind)
            .and_then(|by_addr| by_addr.remove(&addr))
            .map_or(0, |v| v.len())
    }

    /// Fires every watchpoint registered for `(kind, addr)`, in
    /// registration order.
    pub fn fire(&mut self, kind: Kind, addr: u64, value: u64) {
        if let Some(by_addr) = self.watch.get_mut(&kind) {
            if let Some(callbacks) = by_addr.get_mut(&addr) {
                for callback in callbacks {
                    callback(addr, value);
                }
            }
        }
    }

    /// Whether any watchpoint is registered for `(kind, addr)`.
    #[must_use]
    pub fn has_watchpoint(&self, kind: Kind, addr: u64) -> bool {
        self.watch.get(&kind).is_some_and(|by_addr| by_addr.contains_key(&addr))
    }

    /// Installs a cheat: every subsequent read of `addr` should return
    /// `value` instead of the underlying memory's contents.
    ///
    /// Wiring the substitution into an actual read path is the caller's
    /// responsibility; this is the registry of record.
    pub fn set_cheat(&mut self, addr: u64, value: u8) {
        self.cheats.insert(addr, value);
    }

    /// Removes the cheat at `addr`, if any.
    pub fn clear_cheat(&mut self, addr: u64) {
        self.cheats.remove(&addr);
    }

    /// Looks up the cheat override for `addr`, if one is installed.
    #[must_use]
    pub fn cheat(&self, addr: u64) -> Option<u8> {
        self.cheats.get(&addr).copied()
    }

    /// Applies any installed cheat to `value`, substituting it if `addr`
    /// has an active cheat.
    #[must_use]
    pub fn apply_cheats(&self, addr: u64, value: u8) -> u8 {
        self.cheats.get(&addr).copied().unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn watchpoint_fires_on_matching_access() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let mut dbg = Debugger::new();
        let hits2 = Rc::clone(&hits);
        dbg.add_watchpoint(
            Kind::Write,
            0x100,
            Box::new(move |addr, value| hits2.borrow_mut().push((addr, value))),
        );
        dbg.fire(Kind::Write, 0x100, 42);
        dbg.fire(Kind::Read, 0x100, 1); // different kind, should not fire
        assert_eq!(*hits.borrow(), vec![(0x100, 42)]);
    }

    #[test]
    fn clear_watchpoint_removes_callbacks() {
        let mut dbg = Debugger::new();
        dbg.add_watchpoint(Kind::Read, 1, Box::new(|_, _| {}));
        assert_eq!(dbg.clear_watchpoint(Kind::Read, 1), 1);
        assert!(!dbg.has_watchpoint(Kind::Read, 1));
    }

    #[test]
    fn cheat_substitutes_value() {
        let mut dbg = Debugger::new();
        assert_eq!(dbg.apply_cheats(5, 0xAA), 0xAA);
        dbg.set_cheat(5, 0xFF);
        assert_eq!(dbg.apply_cheats(5, 0xAA), 0xFF);
        dbg.clear_cheat(5);
        assert_eq!(dbg.apply_cheats(5, 0xAA), 0xAA);
    }
}
