//! Static table of supported platforms.

use super::PlatformDescriptor;

/// Every platform bagccgop can build for, in dispatch order.
///
/// Based on the Debian ports list. hppa, ia64, m68k and sh4 are missing
/// because they lack a gccgo package; armel is missing because it shares
/// `linux/arm` with armhf.
pub static SUPPORTED_PLATFORMS: &[PlatformDescriptor] = &[
    PlatformDescriptor {
        os: "linux",
        arch: "alpha",
        debian_arch: "alpha",
        package_suffix: "-alpha-linux-gnu",
        gcc_prefix: "alpha-linux-gnu",
        multiarch: "alpha-linux-gnu",
        uname_arch: "alpha",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "ppc",
        debian_arch: "powerpc",
        package_suffix: "-powerpc-linux-gnu",
        gcc_prefix: "powerpc-linux-gnu",
        multiarch: "powerpc-linux-gnu",
        uname_arch: "ppc",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "ppc64",
        debian_arch: "ppc64",
        package_suffix: "-powerpc64-linux-gnu",
        gcc_prefix: "powerpc64-linux-gnu",
        multiarch: "powerpc64-linux-gnu",
        uname_arch: "ppc64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "sparc64",
        debian_arch: "sparc64",
        package_suffix: "-sparc64-linux-gnu",
        gcc_prefix: "sparc64-linux-gnu",
        multiarch: "sparc64-linux-gnu",
        uname_arch: "sparc64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "riscv64",
        debian_arch: "riscv64",
        package_suffix: "-riscv64-linux-gnu",
        gcc_prefix: "riscv64-linux-gnu",
        multiarch: "riscv64-linux-gnu",
        uname_arch: "riscv64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "amd64",
        debian_arch: "amd64",
        package_suffix: "",
        gcc_prefix: "x86_64-linux-gnu",
        multiarch: "x86_64-linux-gnu",
        uname_arch: "x86_64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "arm64",
        debian_arch: "arm64",
        package_suffix: "-aarch64-linux-gnu",
        gcc_prefix: "aarch64-linux-gnu",
        multiarch: "aarch64-linux-gnu",
        uname_arch: "aarch64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "arm",
        debian_arch: "armhf",
        package_suffix: "-arm-linux-gnueabihf",
        gcc_prefix: "arm-linux-gnueabihf",
        multiarch: "arm-linux-gnueabihf",
        uname_arch: "armv7l",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "386",
        debian_arch: "i386",
        package_suffix: "-i686-linux-gnu",
        gcc_prefix: "i686-linux-gnu",
        multiarch: "i386-linux-gnu",
        uname_arch: "i686",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "mipsle",
        debian_arch: "mipsel",
        package_suffix: "-mipsel-linux-gnu",
        gcc_prefix: "mipsel-linux-gnu",
        multiarch: "mipsel-linux-gnu",
        uname_arch: "mips",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "mips64le",
        debian_arch: "mips64el",
        package_suffix: "-mips64el-linux-gnuabi64",
        gcc_prefix: "mips64el-linux-gnuabi64",
        multiarch: "mips64el-linux-gnuabi64",
        uname_arch: "mips64",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "ppc64le",
        debian_arch: "ppc64el",
        package_suffix: "-powerpc64le-linux-gnu",
        gcc_prefix: "powerpc64le-linux-gnu",
        multiarch: "powerpc64le-linux-gnu",
        uname_arch: "ppc64le",
    },
    PlatformDescriptor {
        os: "linux",
        arch: "s390x",
        debian_arch: "s390x",
        package_suffix: "-s390x-linux-gnu",
        gcc_prefix: "s390x-linux-gnu",
        multiarch: "s390x-linux-gnu",
        uname_arch: "s390x",
    },
];
