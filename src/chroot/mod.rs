//! Chroot environments for foreign-architecture builds.
//!
//! Each Debian architecture has a pre-provisioned root filesystem at
//! `<base>/<debian_arch>-chroot`. Before building, host `/dev`, `/proc` and
//! the working directory are bind-mounted into it; the working directory
//! appears at `/data`.
//!
//! Mounts are owned by a [`ChrootSession`] and released with
//! [`ChrootSession::release`].

mod guard;

use std::path::{Path, PathBuf};

use crate::error::{ChrootError, ExecError};
use crate::exec::{CommandRunner, EnvOverlay, Executor, Root, Step};
use guard::MountGuard;

/// Default parent directory of all chroots
pub const DEFAULT_CHROOT_BASE: &str = "/var/lib/bagccgop";

/// Mount point of the working directory, relative to the chroot root
pub const DATA_DIR: &str = "data";

/// Path of the mounted working directory as seen inside the chroot
pub const DATA_DIR_IN_CHROOT: &str = "/data";

/// Mounts and unmounts chroot environments.
#[derive(Debug)]
pub struct ChrootManager<R> {
    executor: Executor<R>,
    base: PathBuf,
}

impl<R: CommandRunner> ChrootManager<R> {
    /// Creates a manager for chroots under `base`
    pub fn new(executor: Executor<R>, base: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            base: base.into(),
        }
    }

    /// Root directory of the chroot for a Debian architecture
    pub fn root(&self, debian_arch: &str) -> PathBuf {
        self.base.join(format!("{}-chroot", debian_arch))
    }

    /// Bind-mounts `/dev`, `/proc` and the working directory, in that order.
    ///
    /// The first failing mount aborts; mounts made before it are released
    /// before the error is returned.
    pub async fn mount(&self, debian_arch: &str) -> Result<ChrootSession<R>, ChrootError> {
        let root = self.root(debian_arch);
        let mut session = ChrootSession {
            executor: self.executor.clone(),
            root: root.clone(),
            guard: MountGuard::default(),
        };

        let binds = [
            (PathBuf::from("/dev"), root.join("dev")),
            (PathBuf::from("/proc"), root.join("proc")),
            (self.executor.host().cwd().to_path_buf(), root.join(DATA_DIR)),
        ];

        for (source, target) in binds {
            let step = Step::exec(
                "mount",
                [
                    "-o".to_string(),
                    "bind".to_string(),
                    source.display().to_string(),
                    target.display().to_string(),
                ],
            );

            if let Err(error) = self
                .executor
                .run_one(&Root::Host, &step, &EnvOverlay::new())
                .await
            {
                session.release().await;
                return Err(ChrootError::MountFailed {
                    source_path: source,
                    target,
                    error,
                });
            }

            log::debug!("mounted {} at {}", source.display(), target.display());
            session.guard.targets.push(target);
        }

        Ok(session)
    }
}

/// A mounted chroot environment.
///
/// Dropping a session without calling [`ChrootSession::release`] detaches
/// the mounts from a blocking drop guard.
#[derive(Debug)]
pub struct ChrootSession<R> {
    executor: Executor<R>,
    root: PathBuf,
    guard: MountGuard,
}

impl<R: CommandRunner> ChrootSession<R> {
    /// Root directory of this chroot
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Execution root for commands inside this chroot
    pub fn exec_root(&self) -> Root {
        Root::Chroot(self.root.clone())
    }

    /// Mount points currently attached, in mount order
    pub fn mounts(&self) -> &[PathBuf] {
        &self.guard.targets
    }

    /// Unmounts in reverse mount order.
    ///
    /// Every mount point is attempted even if an earlier one fails. Failures
    /// are logged and returned; they never fail a build.
    pub async fn release(mut self) -> Vec<ExecError> {
        let mut failures = Vec::new();

        for target in self.guard.disarm().into_iter().rev() {
            let step = Step::exec("umount", [target.display().to_string()]);
            match self
                .executor
                .run_one(&Root::Host, &step, &EnvOverlay::new())
                .await
            {
                Ok(_) => log::debug!("unmounted {}", target.display()),
                Err(e) => {
                    log::warn!("could not unmount {}: {}", target.display(), e);
                    failures.push(e);
                }
            }
        }

        failures
    }
}
