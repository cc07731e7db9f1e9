//! Command line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::platform::ArchNaming;
use crate::{BuildConfig, chroot};

/// Build for all gccgo-supported platforms by default, disable those which you don't want
#[derive(Parser, Debug)]
#[command(
    name = "bagccgop",
    version,
    about = "Build for all gccgo-supported platforms by default, disable those which you don't want (bagop with CGo support)",
    long_about = "Build for all gccgo-supported platforms by default, disable those which you don't want (bagop with CGo support).

Every platform is built inside the chroot at <chroot-base>/<debian-arch>-chroot,
which must already exist. Run as root.

Usage:
  bagccgop -b mybin -x '(linux/alpha|linux/ppc64le)' -j \"$(nproc)\" 'main.go'
  bagccgop -b mybin -x '(linux/alpha|linux/ppc64le)' -j \"$(nproc)\" -p 'go build -o $DST main.go'"
)]
pub struct Args {
    /// Prefix of resulting binary
    #[arg(short = 'b', long = "bin", default_value = "mybin")]
    pub bin: String,

    /// Directory to build into
    #[arg(short = 'd', long = "dist", default_value = "out")]
    pub dist: PathBuf,

    /// Regex of platforms not to build for, i.e. (linux/alpha|linux/ppc64le)
    #[arg(short = 'x', long = "exclude", default_value = "")]
    pub exclude: String,

    /// Extra arguments to pass to the Go compiler
    #[arg(short = 'e', long = "extra-args", default_value = "", allow_hyphen_values = true)]
    pub extra_args: String,

    /// Maximum amount of parallel jobs
    #[arg(short = 'j', long = "jobs", default_value_t = 1, env = "BAGCCGOP_JOBS")]
    pub jobs: usize,

    /// Use Go's conventions (i.e. amd64) instead of uname's conventions (i.e. x86_64)
    #[arg(short = 'g', long = "goisms")]
    pub goisms: bool,

    /// Sets GOOS, GOARCH, CC, GCCGO, GOFLAGS and DST and leaves the rest up to you
    #[arg(short = 'p', long = "plain")]
    pub plain: bool,

    /// Command to run before running the main command; will have only CC and GCCGO set (i.e. for code generation)
    #[arg(short = 'r', long = "prepare")]
    pub prepare: Option<String>,

    /// Comma-separated list of Debian packages to install for the host architecture
    #[arg(short = 's', long = "hostPackages", value_delimiter = ',')]
    pub host_packages: Vec<String>,

    /// Comma-separated list of Debian packages to install for the selected architectures
    #[arg(short = 'a', long = "packages", value_delimiter = ',')]
    pub packages: Vec<String>,

    /// Comma-separated list of Debian packages to manually install for the selected architectures (i.e. those which would break the dependency graph)
    #[arg(short = 'm', long = "manualPackages", value_delimiter = ',')]
    pub manual_packages: Vec<String>,

    /// Log every command before running it
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Directory containing the <debian-arch>-chroot directories
    #[arg(long = "chroot-base", default_value = chroot::DEFAULT_CHROOT_BASE, env = "BAGCCGOP_CHROOT_BASE")]
    pub chroot_base: PathBuf,

    /// Write a JSON report of every platform's outcome to this file
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Input to `go build`, or the whole command with --plain
    #[arg(index = 1, value_name = "INPUT")]
    pub input: String,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl From<Args> for BuildConfig {
    fn from(args: Args) -> Self {
        Self {
            binary_prefix: args.bin,
            dist_dir: args.dist,
            exclude: args.exclude,
            extra_args: args.extra_args,
            jobs: args.jobs,
            naming: if args.goisms {
                ArchNaming::Go
            } else {
                ArchNaming::Uname
            },
            plain: args.plain,
            prepare: args.prepare.filter(|p| !p.is_empty()),
            host_packages: non_empty(args.host_packages),
            packages: non_empty(args.packages),
            manual_packages: non_empty(args.manual_packages),
            verbose: args.verbose,
            input: args.input,
            chroot_base: args.chroot_base,
            report: args.report,
        }
    }
}

/// Drops empty entries left by `-a ''` or trailing commas
fn non_empty(packages: Vec<String>) -> Vec<String> {
    packages.into_iter().filter(|p| !p.is_empty()).collect()
}
