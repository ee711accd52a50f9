//! Rolling File Writer
//!
//! Size-based rotation (`app.log`, `app.log.1`, ... `app.log.{N-1}`) plus a
//! circular buffer of the most recent complete lines.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Rotation and buffer limits
#[derive(Debug, Clone)]
pub struct RollingConfig {
    /// Rotate once the current file would exceed this size
    pub max_file_bytes: u64,
    /// Total number of files kept, current one included
    pub max_files: usize,
    /// Capacity of the in-memory ring of recent lines
    pub recent_lines: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 5,
            recent_lines: 200,
        }
    }
}

struct RollingState {
    dir: PathBuf,
    base_name: String,
    config: RollingConfig,
    file: Option<File>,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

impl RollingState {
    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, index))
    }

    fn open_current(&mut self) -> io::Result<()> {
        let path = self.current_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        // Close before renaming, Windows refuses to move open files
        self.file = None;

        let keep = self.config.max_files.max(1);
        if keep == 1 {
            let _ = fs::remove_file(self.current_path());
        } else {
            let oldest = self.rotated_path(keep - 1);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..keep - 1).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            let current = self.current_path();
            if current.exists() {
                fs::rename(&current, self.rotated_path(1))?;
            }
        }

        self.open_current()
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.config.recent_lines == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                continue;
            }
            self.recent.push_back(line);
            while self.recent.len() > self.config.recent_lines {
                self.recent.pop_front();
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.config.max_file_bytes {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.open_current()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        file.write_all(buf)?;
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(buf.len())
    }
}

/// Cloneable handle to a rolling log file
///
/// Every clone writes into the same file and ring buffer.
#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

impl RollingWriter {
    /// Open (or create) `{dir}/{base_name}.log` for appending
    pub fn open(dir: &Path, base_name: &str, config: RollingConfig) -> Result<Self, String> {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create log dir: {}", e))?;

        let mut state = RollingState {
            dir: dir.to_path_buf(),
            base_name: base_name.to_string(),
            config,
            file: None,
            written: 0,
            recent: VecDeque::new(),
            partial: String::new(),
        };
        state
            .open_current()
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        match self.state.lock() {
            Ok(state) => state.current_path(),
            Err(poisoned) => poisoned.into_inner().current_path(),
        }
    }

    /// Snapshot of the buffered lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().recent.iter().cloned().collect(),
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A panic while logging must not silence every later log line
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
