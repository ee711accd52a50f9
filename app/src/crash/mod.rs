//! Crash Handling
//!
//! Last-resort panic reporting. Nothing here is recoverable; the process
//! always ends after a report is handed off.

mod handler;
mod report;

pub use handler::{
    build_handoff, effective_handoff, pending_report_path, take_pending_crash_report, CrashHandler,
    CrashHandoff, FileHandoff, RelaunchHandoff, RelaunchedReport, CRASH_REPORT_ENV,
};
pub use report::{CrashReport, DeviceInfo, MemoryStats};
