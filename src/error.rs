//! Error types for bagccgop operations.
//!
//! Errors are grouped by where they originate: run configuration, the chroot
//! environment, individual command executions and the per-platform pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for bagccgop operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for all bagccgop operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// Run configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chroot environment errors
    #[error("Chroot error: {0}")]
    Chroot(#[from] ChrootError),

    /// Command execution errors
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Per-platform pipeline errors
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// One or more platforms failed to build
    #[error("{failed} platform(s) failed to build")]
    RunFailed {
        /// Number of failed platforms
        failed: usize,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors, detected before any platform work starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The exclude pattern is not a valid regular expression
    #[error("could not compile exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        /// Pattern as given on the command line
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The job limit must admit at least one pipeline
    #[error("invalid job limit {jobs}: at least one job is required")]
    InvalidJobLimit {
        /// Requested job limit
        jobs: usize,
    },
}

/// Errors while setting up or tearing down a chroot environment
#[derive(Error, Debug)]
pub enum ChrootError {
    /// A bind mount failed; later mounts were not attempted
    #[error("could not mount {source_path} at {target}: {error}")]
    MountFailed {
        /// Host path being mounted
        source_path: PathBuf,
        /// Mount point inside the chroot
        target: PathBuf,
        /// Failing invocation
        #[source]
        error: ExecError,
    },
}

/// Errors from running a single external command
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started or waited on
    #[error("could not run `{command}`: {source}")]
    Spawn {
        /// Fully formed command line
        command: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error(
        "`{command}` failed: exit={}, stdout={stdout}, stderr={stderr}",
        .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
    )]
    Failed {
        /// Fully formed command line
        command: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard output, verbatim
        stdout: String,
        /// Captured standard error, verbatim
        stderr: String,
    },
}

/// Errors from one platform's build pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The chroot environment could not be established
    #[error("could not mount chroot for platform {platform}: {source}")]
    Environment {
        /// Platform as `os/arch`
        platform: String,
        /// Mount failure
        #[source]
        source: ChrootError,
    },

    /// A pipeline step failed
    #[error("could not {stage} for platform {platform}: {source}")]
    Step {
        /// Platform as `os/arch`
        platform: String,
        /// Step that failed
        stage: Stage,
        /// Failing command
        #[source]
        source: ExecError,
    },

    /// The run was cancelled after another platform failed
    #[error("build for platform {platform} stopped before {stage} after another platform failed")]
    Cancelled {
        /// Platform as `os/arch`
        platform: String,
        /// Step that was not started
        stage: Stage,
    },
}

impl PipelineError {
    /// Whether this error only reflects another platform's failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

impl BuildError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BuildError::Config(ConfigError::InvalidExcludePattern { .. }) => vec![
                "Check the --exclude regex, e.g. '(linux/alpha|linux/ppc64le)'".to_string(),
            ],
            BuildError::Config(ConfigError::InvalidJobLimit { .. }) => {
                vec!["Pass --jobs 1 or higher, e.g. --jobs \"$(nproc)\"".to_string()]
            }
            BuildError::Chroot(_) | BuildError::Pipeline(PipelineError::Environment { .. }) => {
                vec![
                    "Run as root; bind mounts require CAP_SYS_ADMIN".to_string(),
                    "Ensure the chroot exists, e.g. /var/lib/bagccgop/arm64-chroot".to_string(),
                ]
            }
            BuildError::RunFailed { .. } => vec![
                "Re-run with --verbose to see every command".to_string(),
                "Exclude failing platforms with --exclude".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
