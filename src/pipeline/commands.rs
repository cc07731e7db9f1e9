//! Commands and environments for each pipeline step.
//!
//! Package names and paths are passed as discrete arguments or positional
//! parameters. Only the prepare command, extra build arguments and the
//! build input are shell text, because the user writes them as such.

use std::path::Path;

use crate::chroot::DATA_DIR_IN_CHROOT;
use crate::exec::{EnvOverlay, HostEnv, Step, shell};
use crate::platform::PlatformDescriptor;

/// Scratch directory for manually installed packages, inside the chroot
pub const MANUAL_PACKAGE_DIR: &str = "/tmp/bagccgop-packages";

/// Go build tool inside the chroot
pub const GO: &str = "go";

/// Compiler variable
pub const ENV_CC: &str = "CC";
/// Go frontend variable
pub const ENV_GCCGO: &str = "GCCGO";
/// cgo switch
pub const ENV_CGO_ENABLED: &str = "CGO_ENABLED";
/// Target OS
pub const ENV_GOOS: &str = "GOOS";
/// Target architecture
pub const ENV_GOARCH: &str = "GOARCH";
/// Go build flags
pub const ENV_GOFLAGS: &str = "GOFLAGS";
/// pkg-config search directory
pub const ENV_PKG_CONFIG_LIBDIR: &str = "PKG_CONFIG_LIBDIR";
/// Additional pkg-config search path
pub const ENV_PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";
/// Output path in plain mode
pub const ENV_DST: &str = "DST";

/// Flag selecting the gccgo backend of `go build`
const GCCGO_COMPILER_FLAG: &str = "-compiler=gccgo";

/// Finishes interrupted package configuration, then repairs broken dependencies.
pub fn repair_steps() -> Vec<Step> {
    vec![
        Step::exec("dpkg", ["--configure", "-a"]),
        Step::exec("apt", ["--fix-broken", "install", "-y"]),
    ]
}

/// Installs one package through apt, resolving dependencies normally.
pub fn install_step(package: &str) -> Step {
    Step::exec("apt", ["install", "-y", package])
}

/// Downloads one package and force-installs it, ignoring dependency errors.
///
/// Three commands: create a scratch directory, download into it, install
/// every `.deb` found there.
pub fn manual_install_steps(qualified_package: &str) -> Vec<Step> {
    let dir = format!("{}/{}", MANUAL_PACKAGE_DIR, qualified_package);

    vec![
        Step::exec("mkdir", ["-p", dir.as_str()]),
        Step::script_with_args(r#"cd "$1" && apt download "$2""#, [dir.as_str(), qualified_package]),
        Step::script_with_args(r#"dpkg -i --force-all "$1"/*.deb"#, [dir.as_str()]),
    ]
}

/// Runs the user's prepare command from the mounted working directory.
pub fn prepare_step(prepare: &str) -> Step {
    Step::script(format!("cd {} && {}", DATA_DIR_IN_CHROOT, prepare))
}

/// Runs the build from the mounted working directory.
///
/// In plain mode `input` is the whole command. Otherwise `go build` is
/// synthesized, with the output path passed as `$1`.
pub fn build_step(input: &str, extra_args: &str, plain: bool, output: &Path) -> Step {
    if plain {
        return Step::script(format!("cd {} && {}", DATA_DIR_IN_CHROOT, input));
    }

    let mut script = format!(r#"cd {} && {} build -o "$1""#, DATA_DIR_IN_CHROOT, GO);
    if !extra_args.is_empty() {
        script.push(' ');
        script.push_str(extra_args);
    }
    script.push(' ');
    script.push_str(input);

    Step::script_with_args(script, [output.display().to_string()])
}

/// `CC` and `GCCGO` only, for the prepare step.
pub fn compiler_overlay(platform: &PlatformDescriptor) -> EnvOverlay {
    EnvOverlay::new()
        .with(ENV_CC, platform.cc())
        .with(ENV_GCCGO, platform.gccgo())
}

/// Full cross-compilation environment for the build step.
///
/// `GOFLAGS` keeps the host's value after the compiler flag.
/// `PKG_CONFIG_PATH` is cleared so host libraries are not picked up.
pub fn build_overlay(
    platform: &PlatformDescriptor,
    host: &HostEnv,
    plain: bool,
    output: &Path,
) -> EnvOverlay {
    let goflags = match host.var(ENV_GOFLAGS) {
        Some(inherited) if !inherited.is_empty() => {
            format!("{} {}", GCCGO_COMPILER_FLAG, inherited)
        }
        _ => GCCGO_COMPILER_FLAG.to_string(),
    };

    let mut overlay = compiler_overlay(platform)
        .with(ENV_CGO_ENABLED, "1")
        .with(ENV_GOOS, platform.os)
        .with(ENV_GOARCH, platform.arch)
        .with(ENV_GOFLAGS, goflags)
        .with(ENV_PKG_CONFIG_LIBDIR, platform.pkg_config_libdir())
        .with(ENV_PKG_CONFIG_PATH, "");

    if plain {
        overlay.set(ENV_DST, shell::quote(&output.display().to_string()));
    }

    overlay
}
