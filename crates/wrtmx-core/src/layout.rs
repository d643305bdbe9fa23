//! Paths of the release file hierarchy, relative to the mirror root.

use wrtmx_schema::{SubtargetName, TargetName};

/// Structured target listing: `.targets.json`
pub const CATALOG: &str = ".targets.json";

/// Rendered target listing: `targets/`
pub const TARGETS: &str = "targets/";

/// Rendered subtarget listing: `targets/<t>/`
pub fn target_dir(target: &TargetName) -> String {
    format!("targets/{target}/")
}

/// Subtarget root: `targets/<t>/<s>/`
pub fn subtarget_dir(target: &TargetName, subtarget: &SubtargetName) -> String {
    format!("targets/{target}/{subtarget}/")
}

/// Package directory listing: `targets/<t>/<s>/packages/`
pub fn packages_dir(target: &TargetName, subtarget: &SubtargetName) -> String {
    format!("{}packages/", subtarget_dir(target, subtarget))
}

/// Package repository index: `targets/<t>/<s>/packages/index.json`
pub fn package_index(target: &TargetName, subtarget: &SubtargetName) -> String {
    format!("{}index.json", packages_dir(target, subtarget))
}

/// Device profiles: `targets/<t>/<s>/profiles.json`
pub fn profiles(target: &TargetName, subtarget: &SubtargetName) -> String {
    format!("{}profiles.json", subtarget_dir(target, subtarget))
}
