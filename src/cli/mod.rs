//! Command line interface for bagccgop.
//!
//! Parses arguments into a [`BuildConfig`], wires the pipeline and
//! scheduler together, and prints the run summary.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use std::sync::Arc;

use crate::error::{BuildError, Result};
use crate::exec::{CommandRunner, Executor, HostEnv, ProcessRunner};
use crate::pipeline::BuildPipeline;
use crate::platform::{PlatformDescriptor, SUPPORTED_PLATFORMS, SkipFilter};
use crate::scheduler::{Outcome, RunReport, Scheduler};
use crate::BuildConfig;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(BuildConfig::from(args), ProcessRunner, SUPPORTED_PLATFORMS).await
}

/// Builds every platform in `catalog` with the given runner.
///
/// Configuration errors are returned before any platform work starts.
/// Returns exit code 0 when every platform was built or skipped.
pub async fn execute<R: CommandRunner>(
    config: BuildConfig,
    runner: R,
    catalog: &[PlatformDescriptor],
) -> Result<i32> {
    let output = OutputManager::new(config.verbose);

    let filter = SkipFilter::new(&config.exclude)?;
    let host = Arc::new(HostEnv::capture()?);
    let config = Arc::new(config);

    let executor = Executor::new(Arc::new(runner), host, config.verbose);
    let pipeline = Arc::new(BuildPipeline::new(executor, Arc::clone(&config)));
    let scheduler = Scheduler::new(pipeline, filter, config.jobs)?;

    output.verbose(&format!(
        "Building {} platform(s) with up to {} job(s)",
        catalog.len(),
        config.jobs
    ));

    let report = scheduler.run(catalog).await;
    print_summary(&report, &output);

    if let Some(path) = &config.report {
        report.write_json(path)?;
        output.verbose(&format!("Wrote run report to {}", path.display()));
    }

    if report.is_success() {
        Ok(0)
    } else {
        Err(BuildError::RunFailed {
            failed: report.failures().count(),
        })
    }
}

fn print_summary(report: &RunReport, output: &OutputManager) {
    output.section("Summary");

    for platform in &report.platforms {
        match &platform.outcome {
            Outcome::Built { output: path } => {
                output.success(&format!("{} → {}", platform.platform, path.display()))
            }
            Outcome::Skipped => output.skipped(&format!("{} skipped", platform.platform)),
            Outcome::Failed { error } => {
                output.error(&format!("{} failed", platform.platform));
                output.indent_err(error);
            }
            Outcome::Cancelled => output.warn(&format!(
                "{} stopped after another platform failed",
                platform.platform
            )),
            Outcome::NotStarted => output.warn(&format!("{} not started", platform.platform)),
        }
    }

    output.info(&format!(
        "{} built, {} skipped, {} failed, {} not completed",
        report.count(|o| matches!(o, Outcome::Built { .. })),
        report.count(|o| matches!(o, Outcome::Skipped)),
        report.count(|o| matches!(o, Outcome::Failed { .. })),
        report.count(|o| matches!(o, Outcome::Cancelled | Outcome::NotStarted)),
    ));
}
