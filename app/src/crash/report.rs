//! Crash report contents and formatting.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt::{self, Write as _};
use std::panic::PanicHookInfo;

use sysinfo::{ProcessesToUpdate, System};

/// Hardware and OS description included in every report
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
    pub sdk_version: String,
}

const UNKNOWN: &str = "unknown";

impl DeviceInfo {
    /// Read device properties from the running system
    ///
    /// The OS description comes from `sysinfo` everywhere. Android adds
    /// vendor, model and SDK level through `getprop`; desktop Linux reads
    /// vendor and model from DMI. Anything unreadable becomes "unknown".
    pub fn detect() -> Self {
        #[cfg(target_os = "android")]
        {
            Self {
                manufacturer: getprop("ro.product.manufacturer"),
                model: getprop("ro.product.model"),
                os_version: os_description(),
                sdk_version: getprop("ro.build.version.sdk"),
            }
        }

        #[cfg(not(target_os = "android"))]
        {
            Self {
                manufacturer: dmi("sys_vendor"),
                model: dmi("product_name"),
                os_version: os_description(),
                sdk_version: std::env::consts::ARCH.to_string(),
            }
        }
    }
}

/// e.g. "Android 13 (kernel 5.15.41)" or "Linux 24.04 Ubuntu (kernel 6.8.0)"
fn os_description() -> String {
    let os = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    match System::kernel_version() {
        Some(kernel) if !os.contains(&kernel) => format!("{} (kernel {})", os, kernel),
        _ => os,
    }
}

#[cfg(target_os = "android")]
fn getprop(key: &str) -> String {
    std::process::Command::new("getprop")
        .arg(key)
        .output()
        .ok()
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(not(target_os = "android"))]
fn dmi(field: &str) -> String {
    std::fs::read_to_string(format!("/sys/devices/virtual/dmi/id/{}", field))
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Process memory figures in kB
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStats {
    pub resident_kb: Option<u64>,
    /// Only known where the kernel reports a high-water mark
    pub peak_resident_kb: Option<u64>,
    pub virtual_kb: Option<u64>,
}

impl MemoryStats {
    pub fn capture() -> Self {
        let mut stats = Self::current_process().unwrap_or_default();
        stats.peak_resident_kb = std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| Self::parse(&status).peak_resident_kb);
        stats
    }

    fn current_process() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        let _ = system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
        let process = system.process(pid)?;
        Some(Self {
            resident_kb: Some(process.memory() / 1024),
            peak_resident_kb: None,
            virtual_kb: Some(process.virtual_memory() / 1024),
        })
    }

    /// Read `/proc/self/status` style `VmRSS`, `VmHWM` and `VmSize` lines
    pub(crate) fn parse(status: &str) -> Self {
        let mut stats = Self::default();
        for line in status.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let kb = value
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<u64>().ok());
            match key.trim() {
                "VmRSS" => stats.resident_kb = kb,
                "VmHWM" => stats.peak_resident_kb = kb,
                "VmSize" => stats.virtual_kb = kb,
                _ => {}
            }
        }
        stats
    }

    fn is_empty(&self) -> bool {
        self.resident_kb.is_none() && self.peak_resident_kb.is_none() && self.virtual_kb.is_none()
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("unavailable");
        }
        let show = |v: Option<u64>| v.map(|kb| format!("{} kB", kb)).unwrap_or_else(|| "?".into());
        write!(
            f,
            "resident {}, peak resident {}, virtual {}",
            show(self.resident_kb),
            show(self.peak_resident_kb),
            show(self.virtual_kb)
        )
    }
}

#[derive(Debug, Clone)]
pub struct CrashReport {
    pub timestamp: String,
    pub app_version: String,
    pub thread: String,
    /// Kind of fault, e.g. `Panic<&str>`
    pub fault_type: String,
    pub message: String,
    pub location: Option<String>,
    pub backtrace: String,
    pub device: DeviceInfo,
    pub memory: MemoryStats,
    pub recent_logs: Vec<String>,
}

impl CrashReport {
    pub fn from_panic(info: &PanicHookInfo<'_>, device: &DeviceInfo) -> Self {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        Self::capture(info.payload(), location, device)
    }

    /// Build a report for `payload` on the current thread
    pub fn capture(payload: &(dyn Any + Send), location: Option<String>, device: &DeviceInfo) -> Self {
        let (fault_type, message) = describe_payload(payload);
        let current = std::thread::current();

        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f %z").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            thread: format!("{} ({:?})", current.name().unwrap_or("<unnamed>"), current.id()),
            fault_type,
            message,
            location,
            backtrace: Backtrace::force_capture().to_string(),
            device: device.clone(),
            memory: MemoryStats::capture(),
            recent_logs: rolling_logger::recent_lines(),
        }
    }
}

fn describe_payload(payload: &(dyn Any + Send)) -> (String, String) {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        ("Panic<&str>".to_string(), s.to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        ("Panic<String>".to_string(), s.clone())
    } else {
        ("Panic<unknown>".to_string(), "<non-string panic payload>".to_string())
    }
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writeln!(out, "=== Family Tree crash report ===")?;
        writeln!(out, "Time: {}", self.timestamp)?;
        writeln!(out, "App version: {}", self.app_version)?;
        writeln!(out, "Thread: {}", self.thread)?;
        writeln!(out, "Type: {}", self.fault_type)?;
        writeln!(out, "Message: {}", self.message)?;
        writeln!(out, "Location: {}", self.location.as_deref().unwrap_or("unknown"))?;

        writeln!(out, "\n--- Device ---")?;
        writeln!(out, "Manufacturer: {}", self.device.manufacturer)?;
        writeln!(out, "Model: {}", self.device.model)?;
        writeln!(out, "OS version: {}", self.device.os_version)?;
        writeln!(out, "SDK version: {}", self.device.sdk_version)?;

        writeln!(out, "\n--- Memory ---")?;
        writeln!(out, "{}", self.memory)?;

        writeln!(out, "\n--- Backtrace ---")?;
        writeln!(out, "{}", self.backtrace.trim_end())?;

        if !self.recent_logs.is_empty() {
            writeln!(out, "\n--- Recent log ---")?;
            for line in &self.recent_logs {
                writeln!(out, "{}", line)?;
            }
        }

        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel() -> DeviceInfo {
        DeviceInfo {
            manufacturer: "Google".to_string(),
            model: "Pixel 8".to_string(),
            os_version: "Android 14".to_string(),
            sdk_version: "34".to_string(),
        }
    }

    #[test]
    fn test_report_contains_type_message_and_sdk() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let report = CrashReport::capture(payload.as_ref(), Some("src/lib.rs:10:5".into()), &pixel());
        let text = report.to_string();

        assert!(text.contains("Type: Panic<&str>"));
        assert!(text.contains("Message: index out of bounds"));
        assert!(text.contains("SDK version: 34"));
        assert!(text.contains("Location: src/lib.rs:10:5"));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
        assert!(text.contains("--- Backtrace ---"));
    }

    #[test]
    fn test_string_and_opaque_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(format!("bad member {}", 7));
        let report = CrashReport::capture(owned.as_ref(), None, &pixel());
        assert_eq!(report.fault_type, "Panic<String>");
        assert_eq!(report.message, "bad member 7");

        let opaque: Box<dyn Any + Send> = Box::new(42u8);
        let report = CrashReport::capture(opaque.as_ref(), None, &pixel());
        assert_eq!(report.fault_type, "Panic<unknown>");
        assert!(report.to_string().contains("Location: unknown"));
    }

    #[test]
    fn test_report_from_real_panic() {
        let payload = std::panic::catch_unwind(|| {
            let members: Vec<u32> = Vec::new();
            members[3]
        })
        .unwrap_err();

        let report = CrashReport::capture(payload.as_ref(), None, &pixel());
        assert_eq!(report.fault_type, "Panic<String>");
        assert!(report.message.contains("index out of bounds"));
    }

    #[test]
    fn test_parse_proc_status() {
        let status = "Name:\tfamily-tree\nVmHWM:\t  20480 kB\nVmRSS:\t  10240 kB\nVmSize:\t 409600 kB\n";
        let stats = MemoryStats::parse(status);

        assert_eq!(stats.resident_kb, Some(10240));
        assert_eq!(stats.peak_resident_kb, Some(20480));
        assert_eq!(stats.virtual_kb, Some(409600));
        assert!(stats.to_string().contains("resident 10240 kB"));
    }

    #[test]
    fn test_missing_memory_stats_are_unavailable() {
        assert_eq!(MemoryStats::default().to_string(), "unavailable");
        assert_eq!(MemoryStats::parse("Name:\tx\n"), MemoryStats::default());
    }

    #[test]
    fn test_detect_never_empty() {
        let device = DeviceInfo::detect();
        assert!(!device.manufacturer.is_empty());
        assert!(!device.os_version.is_empty());
        assert!(!device.sdk_version.is_empty());
    }

    #[test]
    fn test_capture_reads_own_process() {
        let stats = MemoryStats::capture();
        assert!(stats.resident_kb.is_some_and(|kb| kb > 0));
        assert!(stats.virtual_kb.is_some());
        assert_ne!(stats.to_string(), "unavailable");
    }
}
