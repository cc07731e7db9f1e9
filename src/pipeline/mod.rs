//! Per-platform build pipeline.
//!
//! Steps run in a fixed order, each fatal on its first failure:
//! mount, dependency repair, host packages, target packages, manual
//! packages, optional prepare command, build. The chroot is released after
//! the last step on every path.

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::BuildConfig;
use crate::chroot::{ChrootManager, ChrootSession};
use crate::error::{ExecError, PipelineError};
use crate::exec::{CommandRunner, EnvOverlay, Executor, Root, Step};
use crate::platform::{PlatformDescriptor, output_path};

/// Pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Bind-mount the chroot environment
    Mount,
    /// `dpkg --configure -a` and `apt --fix-broken install`
    RepairDependencies,
    /// Unqualified package installs
    HostPackages,
    /// Architecture-qualified package installs
    TargetPackages,
    /// Download and force-install
    ManualPackages,
    /// Optional prepare command
    Prepare,
    /// Build command
    Build,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Stage::Mount => "mount chroot",
            Stage::RepairDependencies => "repair the package database",
            Stage::HostPackages => "install host packages",
            Stage::TargetPackages => "install packages",
            Stage::ManualPackages => "manually install packages",
            Stage::Prepare => "run prepare command",
            Stage::Build => "build",
        };
        f.write_str(action)
    }
}

/// Runs the full pipeline for one platform at a time.
///
/// Cheap to share between scheduler tasks: all state is read-only.
#[derive(Debug)]
pub struct BuildPipeline<R> {
    executor: Executor<R>,
    chroot: ChrootManager<R>,
    config: Arc<BuildConfig>,
}

impl<R: CommandRunner> BuildPipeline<R> {
    /// Creates a pipeline using chroots under `config.chroot_base`
    pub fn new(executor: Executor<R>, config: Arc<BuildConfig>) -> Self {
        let chroot = ChrootManager::new(executor.clone(), config.chroot_base.clone());
        Self {
            executor,
            chroot,
            config,
        }
    }

    /// Where the artifact for a platform is written, relative to the working directory
    pub fn output_path(&self, platform: &PlatformDescriptor) -> PathBuf {
        output_path(
            &self.config.dist_dir,
            &self.config.binary_prefix,
            platform,
            self.config.naming,
        )
    }

    /// Builds one platform, returning the output path.
    ///
    /// `cancel` is checked before every step; once set, the pipeline stops
    /// with [`PipelineError::Cancelled`] without starting further commands.
    pub async fn run(
        &self,
        platform: &PlatformDescriptor,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, PipelineError> {
        let id = platform.id();
        let output = self.output_path(platform);

        checkpoint(&id, Stage::Mount, cancel)?;
        let session = self
            .chroot
            .mount(platform.debian_arch)
            .await
            .map_err(|source| PipelineError::Environment {
                platform: id.clone(),
                source,
            })?;

        let result = self
            .run_in_chroot(&id, platform, &session, &output, cancel)
            .await;

        session.release().await;

        result.map(|()| output)
    }

    async fn run_in_chroot(
        &self,
        id: &str,
        platform: &PlatformDescriptor,
        session: &ChrootSession<R>,
        output: &std::path::Path,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let root = session.exec_root();
        let inherit = EnvOverlay::new();

        // Emulated chroots routinely leave dpkg half-configured
        self.stage(id, Stage::RepairDependencies, cancel, &root, &commands::repair_steps(), &inherit)
            .await?;

        checkpoint(id, Stage::HostPackages, cancel)?;
        for package in &self.config.host_packages {
            let steps = [commands::install_step(package)];
            self.stage(id, Stage::HostPackages, cancel, &root, &steps, &inherit)
                .await?;
        }

        checkpoint(id, Stage::TargetPackages, cancel)?;
        for package in &self.config.packages {
            let steps = [commands::install_step(&platform.qualify_package(package))];
            self.stage(id, Stage::TargetPackages, cancel, &root, &steps, &inherit)
                .await?;
        }

        checkpoint(id, Stage::ManualPackages, cancel)?;
        for package in &self.config.manual_packages {
            let steps = commands::manual_install_steps(&platform.qualify_package(package));
            self.stage(id, Stage::ManualPackages, cancel, &root, &steps, &inherit)
                .await?;
        }

        if let Some(prepare) = self.config.prepare.as_deref() {
            let steps = [commands::prepare_step(prepare)];
            let overlay = commands::compiler_overlay(platform);
            self.stage(id, Stage::Prepare, cancel, &root, &steps, &overlay)
                .await?;
        }

        let steps = [commands::build_step(
            &self.config.input,
            &self.config.extra_args,
            self.config.plain,
            output,
        )];
        let overlay =
            commands::build_overlay(platform, self.executor.host(), self.config.plain, output);
        self.stage(id, Stage::Build, cancel, &root, &steps, &overlay)
            .await
    }

    async fn stage(
        &self,
        id: &str,
        stage: Stage,
        cancel: &CancellationToken,
        root: &Root,
        steps: &[Step],
        overlay: &EnvOverlay,
    ) -> Result<(), PipelineError> {
        checkpoint(id, stage, cancel)?;
        log::debug!("{}: {}", id, stage);

        self.executor
            .run(root, steps, overlay)
            .await
            .map_err(|source: ExecError| PipelineError::Step {
                platform: id.to_string(),
                stage,
                source,
            })
    }
}

fn checkpoint(id: &str, stage: Stage, cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled {
            platform: id.to_string(),
            stage,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_ordered() {
        assert!(Stage::Mount < Stage::RepairDependencies);
        assert!(Stage::ManualPackages < Stage::Prepare);
        assert!(Stage::Prepare < Stage::Build);
    }

    #[test]
    fn test_checkpoint_reports_stage() {
        let cancel = CancellationToken::new();
        assert!(checkpoint("linux/s390x", Stage::Build, &cancel).is_ok());

        cancel.cancel();
        let err = checkpoint("linux/s390x", Stage::Build, &cancel).unwrap_err();
        assert!(err.is_cancellation());
        assert!(err.to_string().contains("before build"));
    }
}
