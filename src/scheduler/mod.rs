//! Bounded-parallelism dispatch of platform pipelines.
//!
//! Platforms are dispatched in catalog order, each as its own tokio task,
//! with at most `jobs` pipelines active at once. The first failure cancels
//! the run: platforms not yet dispatched are never started, and pipelines
//! in flight stop at their next step boundary and release their mounts.
//! A panicking pipeline counts as a failure and cancels the run the same way.

mod report;

pub use report::{Outcome, PlatformReport, RunReport};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;
use crate::exec::CommandRunner;
use crate::pipeline::BuildPipeline;
use crate::platform::{PlatformDescriptor, SkipFilter};

/// Dispatches pipelines under an admission limit.
#[derive(Debug)]
pub struct Scheduler<R> {
    pipeline: Arc<BuildPipeline<R>>,
    filter: SkipFilter,
    jobs: usize,
}

impl<R: CommandRunner> Scheduler<R> {
    /// Creates a scheduler admitting up to `jobs` concurrent pipelines.
    pub fn new(
        pipeline: Arc<BuildPipeline<R>>,
        filter: SkipFilter,
        jobs: usize,
    ) -> Result<Self, ConfigError> {
        if jobs == 0 {
            return Err(ConfigError::InvalidJobLimit { jobs });
        }

        Ok(Self {
            pipeline,
            filter,
            jobs,
        })
    }

    /// Runs every non-skipped platform and waits for all dispatched pipelines.
    pub async fn run(&self, catalog: &[PlatformDescriptor]) -> RunReport {
        let started_at = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let cancel = CancellationToken::new();
        let mut platforms: Vec<PlatformReport> =
            catalog.iter().map(PlatformReport::not_started).collect();
        let mut tasks = JoinSet::new();

        for (index, platform) in catalog.iter().copied().enumerate() {
            let id = platform.id();

            if self.filter.should_skip(&platform) {
                log::info!("skipping {} (platform matched the provided regex)", id);
                platforms[index].outcome = Outcome::Skipped;
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                log::debug!("not starting {} after an earlier failure", id);
                continue;
            };

            log::info!(
                "building {} ({})",
                id,
                self.pipeline.output_path(&platform).display()
            );

            // Overwritten when the task reports back; stays if it panics
            platforms[index].outcome = Outcome::Failed {
                error: format!("build task for platform {} did not complete", id),
            };
            platforms[index].started_at = Some(Utc::now());

            let pipeline = Arc::clone(&self.pipeline);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;

                // Inner task so a panic is seen here, while the permit is still held
                let build_cancel = cancel.clone();
                let build =
                    tokio::spawn(async move { pipeline.run(&platform, &build_cancel).await });
                let result = match build.await {
                    Ok(result) => result,
                    Err(e) => {
                        log::error!("build task for platform {} failed: {}", id, e);
                        cancel.cancel();
                        let error = format!("build task for platform {} panicked: {}", id, e);
                        return (index, Outcome::Failed { error });
                    }
                };

                match &result {
                    Ok(output) => log::info!("built {} ({})", id, output.display()),
                    Err(e) if e.is_cancellation() => log::warn!("{}", e),
                    Err(e) => {
                        log::error!("{}", e);
                        cancel.cancel();
                    }
                }

                (index, Outcome::from(result))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    platforms[index].outcome = outcome;
                    platforms[index].finished_at = Some(Utc::now());
                }
                Err(e) => {
                    log::error!("build task failed: {}", e);
                    cancel.cancel();
                }
            }
        }

        RunReport {
            jobs: self.jobs,
            started_at,
            finished_at: Utc::now(),
            platforms,
        }
    }
}
