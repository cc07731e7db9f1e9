//! Command execution on the host or inside a chroot.
//!
//! Commands are described as structured [`Step`]s rather than shell text.
//! An [`Step::Exec`] reaches the target program with every argument as its
//! own argv element; a [`Step::Script`] runs through bash and receives its
//! arguments as positional parameters (`"$1"`, `"$2"`, ...), so values never
//! have to be spliced into the script text.
//!
//! The [`CommandRunner`] trait is the boundary to the operating system.
//! [`ProcessRunner`] spawns real processes; tests substitute a recorder.

mod env;
mod process;
pub mod shell;

pub use env::{EnvOverlay, HostEnv};
pub use process::ProcessRunner;

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ExecError;

/// Shell used for [`Step::Script`]
pub const SHELL: &str = "/bin/bash";

/// `$0` of scripts run through [`SHELL`]
pub const SCRIPT_NAME: &str = "bagccgop";

/// Where a step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// Directly on the host
    Host,
    /// Inside the chroot at this path
    Chroot(PathBuf),
}

/// One command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A program with discrete arguments
    Exec {
        /// Program name or path
        program: String,
        /// Arguments, one argv element each
        args: Vec<String>,
    },
    /// A bash script with positional parameters
    Script {
        /// Script text
        script: String,
        /// Values of `$1`, `$2`, ...
        args: Vec<String>,
    },
}

impl Step {
    /// A program with discrete arguments
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A bash script without positional parameters
    pub fn script(script: impl Into<String>) -> Self {
        Step::Script {
            script: script.into(),
            args: Vec::new(),
        }
    }

    /// A bash script with positional parameters
    pub fn script_with_args<I, S>(script: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Script {
            script: script.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// argv for running this step directly on the host
    fn argv(&self) -> Vec<String> {
        match self {
            Step::Exec { program, args } => std::iter::once(program.clone())
                .chain(args.iter().cloned())
                .collect(),
            Step::Script { script, args } => [SHELL, "-c", script.as_str(), SCRIPT_NAME]
                .into_iter()
                .map(str::to_string)
                .chain(args.iter().cloned())
                .collect(),
        }
    }
}

/// A fully formed process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to spawn
    pub program: String,
    /// Arguments, one argv element each
    pub args: Vec<String>,
    /// Complete environment of the child
    pub env: BTreeMap<OsString, OsString>,
}

impl Invocation {
    /// Value of a variable in the child's environment, if it is valid UTF-8
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(OsStr::new(key)).and_then(|value| value.to_str())
    }

    /// The invocation as a copy-pasteable shell command line
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| shell::quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Runs invocations. Implemented by [`ProcessRunner`] and by test doubles.
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs the invocation to completion, capturing both output streams
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = std::io::Result<CommandOutput>> + Send;
}

/// Turns steps into invocations and runs them in order.
#[derive(Debug)]
pub struct Executor<R> {
    runner: Arc<R>,
    host: Arc<HostEnv>,
    verbose: bool,
}

impl<R> Clone for Executor<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            host: Arc::clone(&self.host),
            verbose: self.verbose,
        }
    }
}

impl<R: CommandRunner> Executor<R> {
    /// Creates an executor. With `verbose`, every command is logged before it runs.
    pub fn new(runner: Arc<R>, host: Arc<HostEnv>, verbose: bool) -> Self {
        Self {
            runner,
            host,
            verbose,
        }
    }

    /// Host snapshot commands inherit
    pub fn host(&self) -> &HostEnv {
        &self.host
    }

    /// Forms the invocation for a step
    pub fn invocation(&self, root: &Root, step: &Step, overlay: &EnvOverlay) -> Invocation {
        let mut argv = step.argv();
        let (program, args) = match root {
            Root::Host => {
                let program = argv.remove(0);
                (program, argv)
            }
            Root::Chroot(path) => {
                let mut args = Vec::with_capacity(argv.len() + 1);
                args.push(path.display().to_string());
                args.extend(argv);
                ("chroot".to_string(), args)
            }
        };

        Invocation {
            program,
            args,
            env: self.host.merged_with(overlay),
        }
    }

    /// Runs steps in order, stopping at the first that fails.
    pub async fn run(
        &self,
        root: &Root,
        steps: &[Step],
        overlay: &EnvOverlay,
    ) -> Result<(), ExecError> {
        for step in steps {
            self.run_one(root, step, overlay).await?;
        }
        Ok(())
    }

    /// Runs one step; a non-zero exit is an error carrying both streams.
    pub async fn run_one(
        &self,
        root: &Root,
        step: &Step,
        overlay: &EnvOverlay,
    ) -> Result<CommandOutput, ExecError> {
        let invocation = self.invocation(root, step, overlay);
        let command = describe(&invocation, overlay);

        if self.verbose {
            log::info!("{}", command);
        } else {
            log::debug!("{}", command);
        }

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.success {
            return Err(ExecError::Failed {
                command,
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

/// Command line prefixed with the overlay, e.g. `CC=x-gcc chroot /root ...`
fn describe(invocation: &Invocation, overlay: &EnvOverlay) -> String {
    let mut parts: Vec<String> = overlay
        .iter()
        .map(|(key, value)| format!("{}={}", key, shell::quote(value)))
        .collect();
    parts.push(invocation.command_line());
    parts.join(" ")
}
