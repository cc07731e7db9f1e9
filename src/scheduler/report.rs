//! Per-platform outcomes of a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::platform::PlatformDescriptor;

/// What happened to one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Never dispatched because an earlier platform failed
    NotStarted,
    /// Matched the exclude pattern
    Skipped,
    /// Built successfully
    Built {
        /// Artifact path, relative to the working directory
        output: PathBuf,
    },
    /// A step failed
    Failed {
        /// Full diagnostic, including the failing command's output
        error: String,
    },
    /// Stopped between steps after another platform failed
    Cancelled,
}

impl Outcome {
    /// Whether this outcome lets the run succeed
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Skipped | Outcome::Built { .. })
    }
}

impl From<std::result::Result<PathBuf, PipelineError>> for Outcome {
    fn from(result: std::result::Result<PathBuf, PipelineError>) -> Self {
        match result {
            Ok(output) => Outcome::Built { output },
            Err(e) if e.is_cancellation() => Outcome::Cancelled,
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Outcome and timing of one platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformReport {
    /// `os/arch`
    pub platform: String,
    /// Debian architecture of the chroot
    pub debian_arch: String,
    /// Result
    #[serde(flatten)]
    pub outcome: Outcome,
    /// When the pipeline started
    pub started_at: Option<DateTime<Utc>>,
    /// When the pipeline finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl PlatformReport {
    pub(super) fn not_started(platform: &PlatformDescriptor) -> Self {
        Self {
            platform: platform.id(),
            debian_arch: platform.debian_arch.to_string(),
            outcome: Outcome::NotStarted,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Outcomes of every catalog platform, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Maximum concurrent pipelines
    pub jobs: usize,
    /// When dispatch began
    pub started_at: DateTime<Utc>,
    /// When the last pipeline finished
    pub finished_at: DateTime<Utc>,
    /// One entry per catalog platform
    pub platforms: Vec<PlatformReport>,
}

impl RunReport {
    /// Whether every platform was built or skipped
    pub fn is_success(&self) -> bool {
        self.platforms.iter().all(|p| p.outcome.is_ok())
    }

    /// Platforms whose pipeline failed
    pub fn failures(&self) -> impl Iterator<Item = &PlatformReport> {
        self.platforms
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Failed { .. }))
    }

    /// Number of platforms with an outcome matching `predicate`
    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.platforms.iter().filter(|p| predicate(&p.outcome)).count()
    }

    /// Report entry for an `os/arch` id
    pub fn get(&self, platform: &str) -> Option<&PlatformReport> {
        self.platforms.iter().find(|p| p.platform == platform)
    }

    /// Writes the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
