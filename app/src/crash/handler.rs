//! Process-wide panic hook.
//!
//! A panic anywhere in the process ends it: the hook writes a report, hands
//! it to a recovery surface, waits a short grace period and exits.

use std::fs;
use std::io;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::config::{CrashConfig, CrashHandoffKind};
use super::report::{CrashReport, DeviceInfo};

/// Environment variable carrying the report into a relaunched process
pub const CRASH_REPORT_ENV: &str = "FAMILY_TREE_CRASH_REPORT";

const PENDING_REPORT: &str = "crash/pending_report.txt";

/// Destination of a finished crash report
pub trait CrashHandoff: Send + Sync {
    fn hand_off(&self, report: &str) -> io::Result<()>;
}

impl<H: CrashHandoff + ?Sized> CrashHandoff for Box<H> {
    fn hand_off(&self, report: &str) -> io::Result<()> {
        (**self).hand_off(report)
    }
}

/// Leaves the report on disk for the next launch to pick up
pub struct FileHandoff {
    path: PathBuf,
}

impl FileHandoff {
    pub fn new(data_dir: &Path) -> Self {
        Self { path: pending_report_path(data_dir) }
    }
}

impl CrashHandoff for FileHandoff {
    fn hand_off(&self, report: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, report)?;
        fs::rename(&tmp, &self.path)
    }
}

/// Starts a fresh process that shows the report
pub struct RelaunchHandoff {
    program: PathBuf,
    args: Vec<String>,
}

impl RelaunchHandoff {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Relaunch this executable
    pub fn current_exe(args: Vec<String>) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, args))
    }
}

impl CrashHandoff for RelaunchHandoff {
    fn hand_off(&self, report: &str) -> io::Result<()> {
        Command::new(&self.program)
            .args(&self.args)
            .env(CRASH_REPORT_ENV, report)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

type Terminator = Box<dyn Fn(i32) + Send + Sync>;

pub struct CrashHandler {
    handoff: Box<dyn CrashHandoff>,
    device: DeviceInfo,
    grace_period: Duration,
    exit_code: i32,
    terminate: Terminator,
}

impl CrashHandler {
    pub fn new(handoff: impl CrashHandoff + 'static, config: &CrashConfig) -> Self {
        Self {
            handoff: Box::new(handoff),
            device: DeviceInfo::detect(),
            grace_period: Duration::from_millis(config.grace_period_ms),
            exit_code: config.exit_code,
            terminate: Box::new(|code| std::process::exit(code)),
        }
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Replace process exit, for embedding and tests
    pub fn with_terminator(mut self, terminate: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.terminate = Box::new(terminate);
        self
    }

    /// Become the process panic hook, keeping the current one as fallback
    pub fn install(self) {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let report = CrashReport::from_panic(info, &self.device);
            self.on_crash(&report, || previous(info));
        }));
    }

    /// Hand off `report` and end the process
    ///
    /// `fallback` runs when the hand-off fails. Must not panic: a panic in
    /// here aborts the process without a report.
    pub fn on_crash(&self, report: &CrashReport, fallback: impl FnOnce()) {
        if let Err(e) = self.handle(report) {
            eprintln!("Crash report hand-off failed: {}", e);
            fallback();
        }

        if !self.grace_period.is_zero() {
            thread::sleep(self.grace_period);
        }
        (self.terminate)(self.exit_code);
    }

    pub fn handle(&self, report: &CrashReport) -> io::Result<()> {
        self.handoff.hand_off(&report.to_string())
    }
}

pub fn pending_report_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PENDING_REPORT)
}

/// Report left by a crashed previous run, removed once read
pub fn take_pending_crash_report(data_dir: &Path) -> io::Result<Option<String>> {
    let path = pending_report_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(report) => {
            fs::remove_file(&path)?;
            Ok(Some(report))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Report passed to this process by [`RelaunchHandoff`], handed out once
#[derive(Debug, Default)]
pub struct RelaunchedReport {
    relaunched: bool,
    report: Mutex<Option<String>>,
}

impl RelaunchedReport {
    pub fn new(report: Option<String>) -> Self {
        let report = report.filter(|r| !r.is_empty());
        Self { relaunched: report.is_some(), report: Mutex::new(report) }
    }

    /// Read the report from the environment and clear the variable
    ///
    /// Call once at startup, before worker threads read the environment.
    pub fn from_env() -> Self {
        let report = std::env::var(CRASH_REPORT_ENV).ok();
        if report.is_some() {
            std::env::remove_var(CRASH_REPORT_ENV);
        }
        Self::new(report)
    }

    /// This process was started by a crash hand-off
    pub fn is_relaunch(&self) -> bool {
        self.relaunched
    }

    pub fn take(&self) -> Option<String> {
        self.report.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Hand-off to use in this process
///
/// A process that was itself relaunched after a crash keeps its reports on
/// disk, so a crash during startup cannot respawn forever.
pub fn effective_handoff(configured: CrashHandoffKind, relaunched: bool) -> CrashHandoffKind {
    match configured {
        CrashHandoffKind::Relaunch if relaunched => CrashHandoffKind::File,
        kind => kind,
    }
}

/// Build the configured hand-off for `data_dir`
pub fn build_handoff(kind: CrashHandoffKind, data_dir: &Path) -> io::Result<Box<dyn CrashHandoff>> {
    Ok(match kind {
        CrashHandoffKind::File => Box::new(FileHandoff::new(data_dir)),
        CrashHandoffKind::Relaunch => Box::new(RelaunchHandoff::current_exe(Vec::new())?),
    })
}
