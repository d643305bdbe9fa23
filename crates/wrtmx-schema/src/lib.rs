//! Shared types for wrtmx: release identifiers, directory-level names, and
//! the build matrix emitted to CI.

pub mod matrix;
pub mod names;
pub mod release;

// Re-exports
pub use matrix::{BuildMatrix, MatrixEntry, MatrixKey};
pub use names::{ArchName, NameError, SubtargetName, TargetName};
pub use release::ReleaseIdentifier;

/// Architecture reported when every resolution tier comes up empty.
pub const UNKNOWN_ARCH: &str = "unknown";
