//! Drop guard for bind mounts that were never released.
//!
//! The pipeline releases its mounts explicitly on every path that returns.
//! This guard only fires when a session is dropped without release: a
//! panicking pipeline, or a pipeline future dropped mid-step.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use wait_timeout::ChildExt;

/// Upper bound for one lazy unmount during drop
const UNMOUNT_TIMEOUT: Duration = Duration::from_secs(5);

/// Mount points still attached, in mount order.
#[derive(Debug, Default)]
pub(super) struct MountGuard {
    pub(super) targets: Vec<PathBuf>,
}

impl MountGuard {
    /// Takes the mount points, leaving nothing for `Drop` to do
    pub(super) fn disarm(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.targets)
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        let targets: Vec<PathBuf> = self.targets.drain(..).rev().collect();
        if targets.is_empty() {
            return;
        }

        // Waiting blocks the thread; move off a multi-threaded runtime's worker first
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| detach_all(&targets))
            }
            _ => detach_all(&targets),
        }
    }
}

fn detach_all(targets: &[PathBuf]) {
    for target in targets {
        log::warn!(
            "chroot mount {} was not released, detaching it",
            target.display()
        );

        match detach(target) {
            Ok(Some(status)) if status.success() => {}
            Ok(Some(status)) => {
                log::warn!(
                    "umount -l {} exited with code {}",
                    target.display(),
                    status.code().unwrap_or(-1)
                );
            }
            Ok(None) => {
                log::warn!(
                    "timed out detaching {} after {} seconds",
                    target.display(),
                    UNMOUNT_TIMEOUT.as_secs()
                );
            }
            Err(e) => log::warn!("could not run umount for {}: {}", target.display(), e),
        }
    }
}

/// Runs `umount -l` on one target. `Ok(None)` when it timed out and was killed.
fn detach(target: &Path) -> std::io::Result<Option<ExitStatus>> {
    let mut child = Command::new("umount")
        .arg("-l")
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    match child.wait_timeout(UNMOUNT_TIMEOUT) {
        Ok(Some(status)) => Ok(Some(status)),
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            Ok(None)
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(e)
        }
    }
}
