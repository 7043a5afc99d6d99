//! Environment variable names read by [`crate::opt`].

/// Logging filter, e.g. `tascore_core=debug,tascore_sched=info`.
pub const LOG: &str = "TASCORE_LOG";

/// Overrides the project/branch store's data directory, in place of the
/// platform [XDG][xdg] default.
///
/// [xdg]: https://specifications.freedesktop.org/basedir-spec/latest/
pub const DATA_DIR: &str = "TASCORE_DATA_DIR";
