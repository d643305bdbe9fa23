//! Architecture inference from package filenames.
//!
//! Packages are named `<name>_<version>_<arch>.<ext>`. Names and versions
//! never contain `_`, architectures often do (`aarch64_cortex-a53`), so the
//! architecture is everything after the second underscore.

/// Architecture embedded in a package filename, if it follows the convention.
pub fn package_arch(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    let mut parts = stem.splitn(3, '_');
    let name = parts.next()?;
    let version = parts.next()?;
    let arch = parts.next()?;
    if name.is_empty() || version.is_empty() || arch.is_empty() {
        return None;
    }
    Some(arch)
}

/// Package name portion of a conventional filename.
fn package_name(filename: &str) -> &str {
    filename.split('_').next().unwrap_or_default()
}

/// Kernel and kernel-module packages carry a build-specific suffix rather
/// than the repository architecture.
pub fn is_kernel_package(filename: &str) -> bool {
    let name = package_name(filename);
    name == "kernel" || name.starts_with("kernel-") || name.starts_with("kmod-")
}

/// Pick an architecture from a package directory listing: the first
/// non-kernel package, else the first kernel package.
pub fn infer_arch<'a, I>(filenames: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut kernel_fallback = None;
    for filename in filenames {
        let Some(arch) = package_arch(filename) else {
            continue;
        };
        if !is_kernel_package(filename) {
            return Some(arch.to_string());
        }
        if kernel_fallback.is_none() {
            kernel_fallback = Some(arch.to_string());
        }
    }
    kernel_fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_arch() {
        assert_eq!(
            package_arch("base-files_1565-r24106_aarch64_cortex-a53.ipk"),
            Some("aarch64_cortex-a53")
        );
        assert_eq!(package_arch("busybox_1.36.1-r2_x86_64.ipk"), Some("x86_64"));
        assert_eq!(package_arch("Packages.gz"), None);
        assert_eq!(package_arch("sha256sums"), None);
        assert_eq!(package_arch("name_version.ipk"), None);
        assert_eq!(package_arch("a__b.ipk"), None);
    }

    #[test]
    fn test_kernel_detection() {
        assert!(is_kernel_package("kernel_6.6.52~abc-r1_x86_64.ipk"));
        assert!(is_kernel_package("kmod-nf-nat_6.6.52-r1_x86_64.ipk"));
        assert!(!is_kernel_package("kernel.ipk"));
        assert!(!is_kernel_package("libkernelthing_1_x86_64.ipk"));
    }

    #[test]
    fn test_prefers_non_kernel_packages() {
        let files = [
            "Packages",
            "kernel_5.15.150-1-abcdef_mips_24kc_custom.ipk",
            "kmod-usb-core_5.15.150-1_mips_24kc.ipk",
            "libc_1.2.4-r2_mips_24kc.ipk",
        ];
        assert_eq!(infer_arch(files), Some("mips_24kc".to_string()));
    }

    #[test]
    fn test_kernel_fallback_and_none() {
        let files = ["Packages.gz", "kernel_5.15-r1_x86_64.ipk", "kmod-x_5.15-r1_i386.ipk"];
        assert_eq!(infer_arch(files), Some("x86_64".to_string()));

        let files = ["Packages.gz", "index.json"];
        assert_eq!(infer_arch(files), None);
    }
}
