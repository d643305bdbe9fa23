//! Release identifiers.

use serde::{Deserialize, Serialize};

/// A release identifier as supplied by the caller (e.g. `23.05.4` or
/// `24.10-SNAPSHOT`).
///
/// The value is opaque: it is only substituted into mirror URL templates.
/// The one structural question asked of it is whether it names a snapshot,
/// which selects a different mirror set.
///
/// # Example
///
/// ```
/// use wrtmx_schema::ReleaseIdentifier;
///
/// let rel = ReleaseIdentifier::new("24.10-SNAPSHOT").unwrap();
/// assert!(rel.is_snapshot());
/// assert!(!ReleaseIdentifier::new("23.05.4").unwrap().is_snapshot());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseIdentifier(String);

impl ReleaseIdentifier {
    /// Create a release identifier. Returns `None` for an empty string.
    pub fn new(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(Self(s.to_string()))
        }
    }

    /// Whether this identifier refers to a snapshot build.
    pub fn is_snapshot(&self) -> bool {
        self.0.to_ascii_uppercase().ends_with("SNAPSHOT")
    }

    /// Return the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReleaseIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
