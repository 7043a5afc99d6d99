//! Function/class groups and the interpreter-owning `State`.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::params::Cursor;
use crate::value::Value;

/// A native function bound into the scripting surface.
pub type Binding = Box<dyn Fn(Cursor<'_>) -> Result<Value, Error>>;

/// An error raised while dispatching a bound callback.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// No function with this name is registered in any attached group.
    #[error("unknown function: {0}")]
    NotFound(String),
    /// The callback itself reported an error.
    #[error("{0}")]
    Callback(String),
}

impl From<crate::params::Error> for Error {
    fn from(err: crate::params::Error) -> Self {
        Error::Callback(err.to_string())
    }
}

/// A named collection of callable bindings.
///
/// Re-registering a name already present replaces the previous binding,
/// mirroring how a hot-reloaded script would expect its own redefinitions
/// to take effect immediately.
#[derive(Default)]
pub struct FunctionGroup {
    name: String,
    functions: IndexMap<String, Binding>,
}

impl FunctionGroup {
    /// Constructs an empty, named group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
        }
    }

    /// This group's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `binding` under `name`.
    pub fn add(&mut self, name: impl Into<String>, binding: Binding) {
        self.functions.insert(name.into(), binding);
    }

    /// Removes the binding registered under `name`.
    ///
    /// Returns whether a binding was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.functions.shift_remove(name).is_some()
    }

    /// Looks up and invokes the binding registered under `name`.
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, Error>> {
        self.functions.get(name).map(|f| f(Cursor::new(args)))
    }

    /// Enumerates every bound name, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Dispatch surface for a registered native class: metatable-like access
/// into pinned objects of a single Rust type, type-erased so heterogeneous
/// classes can share one [`ClassGroup`].
pub trait ClassBase {
    /// This class's script-facing name.
    fn name(&self) -> &str;

    /// Names of this class's static (non-instance) methods.
    fn static_methods(&self) -> Vec<&str>;

    /// Names of this class's instance methods.
    fn class_methods(&self) -> Vec<&str>;

    /// Whether the argument at `argno` (1-based) is an instance of this
    /// class.
    fn is(&self, args: &[Value], argno: usize) -> bool;
}

/// A named collection of registered classes.
#[derive(Default)]
pub struct ClassGroup {
    name: String,
    classes: IndexMap<String, Box<dyn ClassBase>>,
}

impl ClassGroup {
    /// Constructs an empty, named group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: IndexMap::new(),
        }
    }

    /// This group's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `class`.
    pub fn add(&mut self, class: Box<dyn ClassBase>) {
        self.classes.insert(class.name().to_string(), class);
    }

    /// Removes the class registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.classes.shift_remove(name).is_some()
    }

    /// Looks up a registered class by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ClassBase> {
        self.classes.get(name).map(AsRef::as_ref)
    }
}

/// Owns the embedded interpreter's registration state: every attached
/// function/class group, and the set of [`Self::do_once`] keys already
/// consumed for this state's lifetime.
#[derive(Default)]
pub struct State {
    functions: Vec<FunctionGroup>,
    classes: Vec<ClassGroup>,
    once: HashSet<String>,
}

impl State {
    /// Constructs a fresh, empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a function group, registering its bindings into this
    /// state.
    pub fn attach_functions(&mut self, group: FunctionGroup) {
        self.functions.push(group);
    }

    /// Attaches a class group.
    pub fn attach_classes(&mut self, group: ClassGroup) {
        self.classes.push(group);
    }

    /// Re-creates the interpreter: clears the `do_once` guard set, but
    /// keeps every attached group (they re-register themselves into the
    /// fresh interpreter, which in this model means simply that their
    /// bindings remain callable).
    pub fn reset(&mut self) {
        self.once.clear();
    }

    /// Tears down the interpreter and every attached group.
    pub fn deinit(&mut self) {
        self.functions.clear();
        self.classes.clear();
        self.once.clear();
    }

    /// Resolves `name` across every attached function group (in attachment
    /// order) and invokes it with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no attached group has a binding named
    /// `name`, or propagates the binding's own error.
    pub fn callback(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        for group in &self.functions {
            if let Some(result) = group.call(name, args) {
                return result;
            }
        }
        Err(Error::NotFound(name.to_string()))
    }

    /// Returns `true` the first time it's called with a given `key` for
    /// this state's lifetime (until the next [`Self::reset`]), and `false`
    /// on every subsequent call with the same key.
    pub fn do_once(&mut self, key: &str) -> bool {
        self.once.insert(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_dispatches_to_attached_group() {
        let mut group = FunctionGroup::new("math");
        group.add("double", Box::new(|mut args: Cursor<'_>| Ok(Value::Integer(args.arg::<i64>()? * 2))));
        let mut state = State::new();
        state.attach_functions(group);

        let result = state.callback("double", &[Value::Integer(21)]).unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[test]
    fn callback_reports_not_found() {
        let state = State::new();
        assert!(matches!(state.callback("missing", &[]), Err(Error::NotFound(_))));
    }

    #[test]
    fn do_once_fires_exactly_once_until_reset() {
        let mut state = State::new();
        assert!(state.do_once("init"));
        assert!(!state.do_once("init"));
        state.reset();
        assert!(state.do_once("init"));
    }

    #[test]
    fn remove_drops_binding() {
        let mut group = FunctionGroup::new("g");
        group.add("f", Box::new(|_| Ok(Value::Nil)));
        assert!(group.remove("f"));
        assert!(!group.remove("f"));
    }
}
