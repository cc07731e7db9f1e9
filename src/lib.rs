//! # bagccgop
//!
//! Build a Go program for every gccgo-supported Debian port from one
//! machine, with cgo enabled.
//!
//! Each platform is built inside a foreign-architecture chroot at
//! `/var/lib/bagccgop/<debian-arch>-chroot`, using the cross toolchain
//! installed there. Several platforms build concurrently up to a job limit.
//!
//! ## Usage
//!
//! ```bash
//! bagccgop -b mybin -x '(linux/alpha|linux/ppc64le)' -j "$(nproc)" 'main.go'
//! bagccgop -b mybin -j "$(nproc)" -p 'go build -o $DST main.go'
//! ```
//!
//! ## Pipeline
//!
//! For every platform not matched by the exclude pattern:
//!
//! 1. bind-mount `/dev`, `/proc` and the working directory into the chroot
//! 2. repair the package database
//! 3. install host, target and manual packages
//! 4. run the prepare command, if any
//! 5. run `go build` (or the plain command) with the cross environment
//!
//! The first failure stops the run; see [`scheduler`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chroot;
pub mod cli;
pub mod error;
pub mod exec;
pub mod pipeline;
pub mod platform;
pub mod scheduler;

pub use cli::Args;
pub use error::{BuildError, Result};
pub use exec::{CommandRunner, Executor, HostEnv, ProcessRunner};
pub use pipeline::BuildPipeline;
pub use platform::{ArchNaming, PlatformDescriptor, SUPPORTED_PLATFORMS, SkipFilter};
pub use scheduler::{Outcome, RunReport, Scheduler};

use std::path::PathBuf;

/// Configuration for a build run
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Prefix of every output filename
    pub binary_prefix: String,
    /// Directory outputs are written to, relative to the working directory
    pub dist_dir: PathBuf,
    /// Regex of `os/arch` ids not to build
    pub exclude: String,
    /// Extra arguments for `go build`
    pub extra_args: String,
    /// Maximum concurrent platform pipelines
    pub jobs: usize,
    /// Architecture naming in output filenames
    pub naming: ArchNaming,
    /// Treat `input` as the whole build command
    pub plain: bool,
    /// Command run before the build with only `CC` and `GCCGO` set
    pub prepare: Option<String>,
    /// Packages installed for the chroot's own architecture
    pub host_packages: Vec<String>,
    /// Packages installed qualified with the target architecture
    pub packages: Vec<String>,
    /// Packages downloaded and force-installed for the target architecture
    pub manual_packages: Vec<String>,
    /// Log every command before it runs
    pub verbose: bool,
    /// Build input, or the whole command in plain mode
    pub input: String,
    /// Parent directory of the chroots
    pub chroot_base: PathBuf,
    /// Where to write the JSON run report
    pub report: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            binary_prefix: "mybin".to_string(),
            dist_dir: PathBuf::from("out"),
            exclude: String::new(),
            extra_args: String::new(),
            jobs: 1,
            naming: ArchNaming::Uname,
            plain: false,
            prepare: None,
            host_packages: Vec::new(),
            packages: Vec::new(),
            manual_packages: Vec::new(),
            verbose: false,
            input: String::new(),
            chroot_base: PathBuf::from(chroot::DEFAULT_CHROOT_BASE),
            report: None,
        }
    }
}
