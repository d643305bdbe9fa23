//! Validated names for the three levels of the build matrix.
//!
//! Targets and subtargets are single directory components discovered on a
//! mirror, so they may not be empty, contain a path separator, or be one of
//! the relative directory links. Package architectures follow the same rule.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a discovered string is not a usable name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name was empty (or only whitespace).
    #[error("empty {0} name")]
    Empty(&'static str),

    /// The name contains a path separator or is a relative link.
    #[error("invalid {kind} name '{value}'")]
    Invalid {
        /// Which level the name was meant for.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

fn validate(kind: &'static str, s: &str) -> Result<String, NameError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NameError::Empty(kind));
    }
    if s == "." || s == ".." || s.contains('/') || s.contains('\\') || s.contains('?') {
        return Err(NameError::Invalid {
            kind,
            value: s.to_string(),
        });
    }
    Ok(s.to_string())
}

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a validated name.
            pub fn new(s: &str) -> Result<Self, NameError> {
                validate($kind, s).map(Self)
            }

            /// Return the raw string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(&s)
            }
        }

        impl From<$name> for String {
            fn from(n: $name) -> Self {
                n.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(
    /// A top-level hardware platform family (e.g. `mediatek`).
    TargetName,
    "target"
);

name_type!(
    /// A variant within a target (e.g. `filogic`).
    SubtargetName,
    "subtarget"
);

name_type!(
    /// A package architecture identifier (e.g. `aarch64_cortex-a53`).
    ArchName,
    "architecture"
);

impl ArchName {
    /// The placeholder architecture used when resolution is exhausted.
    pub fn unknown() -> Self {
        Self(crate::UNKNOWN_ARCH.to_string())
    }

    /// Whether this is the [`unknown`](Self::unknown) placeholder.
    pub fn is_unknown(&self) -> bool {
        self.0 == crate::UNKNOWN_ARCH
    }
}
