//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bagccgop::exec::{CommandOutput, CommandRunner, Executor, HostEnv, Invocation};
use bagccgop::{BuildConfig, BuildPipeline};

pub const CHROOT_BASE: &str = "/chroots";
pub const PROJECT_DIR: &str = "/work/project";

type FailWhen = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// One recorded invocation with its start and end time.
#[derive(Debug, Clone)]
pub struct Record {
    pub invocation: Invocation,
    pub started: Instant,
    pub finished: Instant,
}

impl Record {
    /// program followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.invocation.program.clone())
            .chain(self.invocation.args.iter().cloned())
            .collect()
    }

    /// Debian architecture of the chroot this invocation touches
    pub fn debian_arch(&self) -> Option<String> {
        self.invocation.args.iter().find_map(|arg| {
            let start = arg.strip_prefix(&format!("{}/", CHROOT_BASE))?;
            let dir = start.split('/').next()?;
            dir.strip_suffix("-chroot").map(str::to_string)
        })
    }
}

/// Records every invocation instead of spawning it.
pub struct RecordingRunner {
    records: Mutex<Vec<Record>>,
    fail_when: FailWhen,
    panic_when: FailWhen,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingRunner {
    /// Succeeds on every invocation
    pub fn new() -> Self {
        Self::failing_when(|_| false)
    }

    /// Fails invocations matching the predicate
    pub fn failing_when(fail_when: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_when: Box::new(fail_when),
            panic_when: Box::new(|_| false),
            delay: Duration::ZERO,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Panics on invocations matching the predicate, after recording them
    pub fn panicking_when(
        mut self,
        panic_when: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.panic_when = Box::new(panic_when);
        self
    }

    /// Makes every invocation take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.records().iter().map(Record::argv).collect()
    }

    /// Highest number of invocations running at the same time
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let started = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(Record {
            invocation: invocation.clone(),
            started,
            finished: Instant::now(),
        });

        if (self.panic_when)(invocation) {
            panic!("runner panicked on {}", invocation.command_line());
        }

        if (self.fail_when)(invocation) {
            return Ok(CommandOutput {
                success: false,
                code: Some(100),
                stdout: "stub stdout\n".to_string(),
                stderr: "stub stderr\n".to_string(),
            });
        }

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            ..CommandOutput::default()
        })
    }
}

/// Host snapshot with a fixed working directory and `GOFLAGS`
pub fn host_env() -> HostEnv {
    HostEnv::new(
        [
            ("PATH".to_string(), "/usr/sbin:/usr/bin".to_string()),
            ("GOFLAGS".to_string(), "-mod=vendor".to_string()),
        ],
        PROJECT_DIR,
    )
}

/// Config with test chroot base and `main.go` input
pub fn config() -> BuildConfig {
    BuildConfig {
        input: "main.go".to_string(),
        chroot_base: PathBuf::from(CHROOT_BASE),
        ..BuildConfig::default()
    }
}

pub fn pipeline(runner: Arc<RecordingRunner>, config: BuildConfig) -> Arc<BuildPipeline<RecordingRunner>> {
    let executor = Executor::new(runner, Arc::new(host_env()), false);
    Arc::new(BuildPipeline::new(executor, Arc::new(config)))
}

/// Whether any argument contains `needle`
pub fn mentions(invocation: &Invocation, needle: &str) -> bool {
    invocation.args.iter().any(|arg| arg.contains(needle))
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
