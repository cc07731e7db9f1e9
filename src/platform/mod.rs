//! Target platforms, output naming and the exclude filter.
//!
//! A platform is one Debian port for which a gccgo cross toolchain exists.
//! Every platform is built inside its own chroot, named after its Debian
//! architecture.

mod catalog;
mod filter;

pub use catalog::SUPPORTED_PLATFORMS;
pub use filter::SkipFilter;

use std::path::{Path, PathBuf};

/// Describes one build target and the names it goes by in each toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// Operating system in Go's naming (`GOOS`)
    pub os: &'static str,
    /// Architecture in Go's naming (`GOARCH`)
    pub arch: &'static str,
    /// Debian architecture, used for the chroot directory and `pkg:arch` names
    pub debian_arch: &'static str,
    /// Suffix of the cross toolchain packages, empty for the host architecture
    pub package_suffix: &'static str,
    /// Cross toolchain prefix, e.g. `aarch64-linux-gnu`
    pub gcc_prefix: &'static str,
    /// Debian multiarch tuple, used for the pkg-config library directory
    pub multiarch: &'static str,
    /// Architecture as reported by `uname -m`
    pub uname_arch: &'static str,
}

impl PlatformDescriptor {
    /// `os/arch`, the string matched by the exclude filter
    pub fn id(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    /// C compiler of the cross toolchain
    pub fn cc(&self) -> String {
        format!("{}-gcc", self.gcc_prefix)
    }

    /// Go frontend of the cross toolchain
    pub fn gccgo(&self) -> String {
        format!("{}-gccgo", self.gcc_prefix)
    }

    /// Qualifies a package name with this platform's Debian architecture
    pub fn qualify_package(&self, package: &str) -> String {
        format!("{}:{}", package, self.debian_arch)
    }

    /// pkg-config directory holding this architecture's `.pc` files
    pub fn pkg_config_libdir(&self) -> String {
        format!("/usr/lib/{}/pkgconfig", self.multiarch)
    }

    /// Architecture name used in output filenames
    pub fn arch_identifier(&self, naming: ArchNaming) -> &'static str {
        match naming {
            ArchNaming::Uname => self.uname_arch,
            ArchNaming::Go => self.arch,
        }
    }
}

/// Naming convention for the architecture part of output filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchNaming {
    /// `uname -m` names, e.g. `x86_64`
    #[default]
    Uname,
    /// Go names, e.g. `amd64`
    Go,
}

/// Computes `<dist>/<bin>.<os>-<arch>` for a platform.
pub fn output_path(
    dist: &Path,
    binary_prefix: &str,
    platform: &PlatformDescriptor,
    naming: ArchNaming,
) -> PathBuf {
    dist.join(format!(
        "{}.{}-{}",
        binary_prefix,
        platform.os,
        platform.arch_identifier(naming)
    ))
}
