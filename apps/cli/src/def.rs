//! Shared definitions.

/// Name of this crate.
///
/// This may be used for base subdirectories.
pub const NAME: &str = "tascore";
