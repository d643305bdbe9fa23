//! The build matrix: one entry per (target, subtarget, architecture).
//!
//! Serialized as `{"include":[{"target":..,"subtarget":..,"pkgarch":..}]}`,
//! which CI systems accept directly as a job matrix.

use serde::{Deserialize, Serialize};

use crate::names::{ArchName, SubtargetName, TargetName};

/// One build job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Hardware platform family.
    pub target: TargetName,
    /// Variant within the target.
    pub subtarget: SubtargetName,
    /// Package architecture the subtarget builds against.
    pub pkgarch: ArchName,
}

impl MatrixEntry {
    /// Create an entry.
    pub fn new(target: TargetName, subtarget: SubtargetName, pkgarch: ArchName) -> Self {
        Self {
            target,
            subtarget,
            pkgarch,
        }
    }

    /// The dedup key for this entry.
    pub fn key(&self) -> MatrixKey {
        MatrixKey(format!(
            "{}|{}|{}",
            self.target, self.subtarget, self.pkgarch
        ))
    }
}

/// Composite `target|subtarget|pkgarch` key used to drop duplicate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixKey(String);

impl MatrixKey {
    /// Return the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatrixKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full, deduplicated enumeration of build jobs for one release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMatrix {
    /// Entries in discovery order.
    pub include: Vec<MatrixEntry>,
}

impl BuildMatrix {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.include.len()
    }

    /// Whether the matrix has no entries.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> std::slice::Iter<'_, MatrixEntry> {
        self.include.iter()
    }
}

impl<'a> IntoIterator for &'a BuildMatrix {
    type Item = &'a MatrixEntry;
    type IntoIter = std::slice::Iter<'a, MatrixEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.include.iter()
    }
}
