//! Pipeline step ordering, environments and mount lifecycle.

mod common;

use std::sync::Arc;

use bagccgop::error::{ChrootError, PipelineError};
use bagccgop::pipeline::Stage;
use bagccgop::{PlatformDescriptor, SUPPORTED_PLATFORMS};
use common::{RecordingRunner, config, mentions, pipeline, strings};
use tokio_util::sync::CancellationToken;

fn platform(debian_arch: &str) -> PlatformDescriptor {
    *SUPPORTED_PLATFORMS
        .iter()
        .find(|p| p.debian_arch == debian_arch)
        .unwrap()
}

const ROOT: &str = "/chroots/arm64-chroot";

#[tokio::test]
async fn test_full_pipeline_runs_steps_in_order() {
    let runner = Arc::new(RecordingRunner::new());
    let config = bagccgop::BuildConfig {
        host_packages: strings(&["protobuf-compiler"]),
        packages: strings(&["libssl-dev"]),
        manual_packages: strings(&["libfoo"]),
        prepare: Some("go generate ./...".to_string()),
        ..config()
    };

    let output = pipeline(Arc::clone(&runner), config)
        .run(&platform("arm64"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.to_str(), Some("out/mybin.linux-aarch64"));

    let manual_dir = "/tmp/bagccgop-packages/libfoo:arm64";
    let expected: Vec<Vec<String>> = vec![
        strings(&["mount", "-o", "bind", "/dev", "/chroots/arm64-chroot/dev"]),
        strings(&["mount", "-o", "bind", "/proc", "/chroots/arm64-chroot/proc"]),
        strings(&["mount", "-o", "bind", "/work/project", "/chroots/arm64-chroot/data"]),
        strings(&["chroot", ROOT, "dpkg", "--configure", "-a"]),
        strings(&["chroot", ROOT, "apt", "--fix-broken", "install", "-y"]),
        strings(&["chroot", ROOT, "apt", "install", "-y", "protobuf-compiler"]),
        strings(&["chroot", ROOT, "apt", "install", "-y", "libssl-dev:arm64"]),
        strings(&["chroot", ROOT, "mkdir", "-p", manual_dir]),
        strings(&[
            "chroot",
            ROOT,
            "/bin/bash",
            "-c",
            r#"cd "$1" && apt download "$2""#,
            "bagccgop",
            manual_dir,
            "libfoo:arm64",
        ]),
        strings(&[
            "chroot",
            ROOT,
            "/bin/bash",
            "-c",
            r#"dpkg -i --force-all "$1"/*.deb"#,
            "bagccgop",
            manual_dir,
        ]),
        strings(&["chroot", ROOT, "/bin/bash", "-c", "cd /data && go generate ./...", "bagccgop"]),
        strings(&[
            "chroot",
            ROOT,
            "/bin/bash",
            "-c",
            r#"cd /data && go build -o "$1" main.go"#,
            "bagccgop",
            "out/mybin.linux-aarch64",
        ]),
        strings(&["umount", "/chroots/arm64-chroot/data"]),
        strings(&["umount", "/chroots/arm64-chroot/proc"]),
        strings(&["umount", "/chroots/arm64-chroot/dev"]),
    ];

    assert_eq!(runner.argvs(), expected);
}

#[tokio::test]
async fn test_failed_mount_releases_earlier_mounts() {
    let runner = Arc::new(RecordingRunner::failing_when(|inv| {
        inv.program == "mount" && mentions(inv, "/proc")
    }));

    let err = pipeline(Arc::clone(&runner), config())
        .run(&platform("arm64"), &CancellationToken::new())
        .await
        .unwrap_err();

    match &err {
        PipelineError::Environment {
            platform,
            source: ChrootError::MountFailed { target, .. },
        } => {
            assert_eq!(platform, "linux/arm64");
            assert_eq!(target.to_str(), Some("/chroots/arm64-chroot/proc"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("stub stderr"));

    assert_eq!(
        runner.argvs(),
        vec![
            strings(&["mount", "-o", "bind", "/dev", "/chroots/arm64-chroot/dev"]),
            strings(&["mount", "-o", "bind", "/proc", "/chroots/arm64-chroot/proc"]),
            strings(&["umount", "/chroots/arm64-chroot/dev"]),
        ]
    );
}

#[tokio::test]
async fn test_failed_download_skips_install_and_build() {
    let runner = Arc::new(RecordingRunner::failing_when(|inv| {
        mentions(inv, "apt download")
    }));
    let config = bagccgop::BuildConfig {
        manual_packages: strings(&["libfoo", "libbar"]),
        ..config()
    };

    let err = pipeline(Arc::clone(&runner), config)
        .run(&platform("arm64"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Step {
            stage: Stage::ManualPackages,
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains("could not manually install packages for platform linux/arm64"));
    assert!(message.contains("exit=100"));

    let records = runner.records();
    assert!(!records.iter().any(|r| mentions(&r.invocation, "dpkg -i")));
    assert!(!records.iter().any(|r| mentions(&r.invocation, "libbar")));
    assert!(!records.iter().any(|r| mentions(&r.invocation, "go build")));

    let unmounts = records
        .iter()
        .filter(|r| r.invocation.program == "umount")
        .count();
    assert_eq!(unmounts, 3);
}

#[tokio::test]
async fn test_package_names_stay_single_arguments() {
    let runner = Arc::new(RecordingRunner::new());
    let config = bagccgop::BuildConfig {
        host_packages: strings(&["foo; rm -rf /"]),
        packages: strings(&["lib with space"]),
        ..config()
    };

    pipeline(Arc::clone(&runner), config)
        .run(&platform("arm64"), &CancellationToken::new())
        .await
        .unwrap();

    let argvs = runner.argvs();
    assert!(argvs.contains(&strings(&["chroot", ROOT, "apt", "install", "-y", "foo; rm -rf /"])));
    assert!(argvs.contains(&strings(&[
        "chroot",
        ROOT,
        "apt",
        "install",
        "-y",
        "lib with space:arm64"
    ])));
}

#[tokio::test]
async fn test_prepare_gets_compilers_and_build_gets_full_environment() {
    let runner = Arc::new(RecordingRunner::new());
    let config = bagccgop::BuildConfig {
        prepare: Some("make deps".to_string()),
        ..config()
    };

    pipeline(Arc::clone(&runner), config)
        .run(&platform("s390x"), &CancellationToken::new())
        .await
        .unwrap();

    let records = runner.records();
    let prepare = records
        .iter()
        .find(|r| mentions(&r.invocation, "make deps"))
        .unwrap();
    let env_var = |key: &str| prepare.invocation.env_var(key);
    assert_eq!(env_var("CC"), Some("s390x-linux-gnu-gcc"));
    assert_eq!(env_var("GCCGO"), Some("s390x-linux-gnu-gccgo"));
    assert_eq!(env_var("GOFLAGS"), Some("-mod=vendor"));
    assert_eq!(env_var("PATH"), Some("/usr/sbin:/usr/bin"));
    assert_eq!(env_var("GOOS"), None);
    assert_eq!(env_var("CGO_ENABLED"), None);

    let build = records
        .iter()
        .find(|r| mentions(&r.invocation, "go build"))
        .unwrap();
    let env_var = |key: &str| build.invocation.env_var(key);
    assert_eq!(env_var("CGO_ENABLED"), Some("1"));
    assert_eq!(env_var("GOOS"), Some("linux"));
    assert_eq!(env_var("GOARCH"), Some("s390x"));
    assert_eq!(env_var("GOFLAGS"), Some("-compiler=gccgo -mod=vendor"));
    assert_eq!(env_var("PKG_CONFIG_LIBDIR"), Some("/usr/lib/s390x-linux-gnu/pkgconfig"));
    assert_eq!(env_var("PKG_CONFIG_PATH"), Some(""));
    assert_eq!(env_var("DST"), None);

    // Nothing in chroot runs before the mounts or after the unmounts
    let first_chroot = records.iter().position(|r| r.invocation.program == "chroot").unwrap();
    let last_chroot = records.iter().rposition(|r| r.invocation.program == "chroot").unwrap();
    assert!(records[..first_chroot].iter().all(|r| r.invocation.program == "mount"));
    assert!(records[last_chroot + 1..].iter().all(|r| r.invocation.program == "umount"));
}

#[tokio::test]
async fn test_plain_mode_runs_input_with_dst() {
    let runner = Arc::new(RecordingRunner::new());
    let config = bagccgop::BuildConfig {
        plain: true,
        binary_prefix: "my app".to_string(),
        input: "go build -o $DST ./cmd/app".to_string(),
        ..config()
    };

    let output = pipeline(Arc::clone(&runner), config)
        .run(&platform("amd64"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.to_str(), Some("out/my app.linux-x86_64"));

    let records = runner.records();
    let build = records
        .iter()
        .find(|r| mentions(&r.invocation, "./cmd/app"))
        .unwrap();
    assert_eq!(
        build.argv(),
        strings(&[
            "chroot",
            "/chroots/amd64-chroot",
            "/bin/bash",
            "-c",
            "cd /data && go build -o $DST ./cmd/app",
            "bagccgop",
        ])
    );
    assert_eq!(
        build.invocation.env_var("DST"),
        Some("'out/my app.linux-x86_64'")
    );
}

#[tokio::test]
async fn test_go_naming_uses_go_arch() {
    let runner = Arc::new(RecordingRunner::new());
    let config = bagccgop::BuildConfig {
        naming: bagccgop::ArchNaming::Go,
        ..config()
    };

    let output = pipeline(runner, config)
        .run(&platform("armhf"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.to_str(), Some("out/mybin.linux-arm"));
}

#[tokio::test]
async fn test_cancelled_pipeline_runs_nothing() {
    let runner = Arc::new(RecordingRunner::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline(Arc::clone(&runner), config())
        .run(&platform("arm64"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancellation());
    assert!(runner.records().is_empty());
}
