//! `log` backend for the server: filters like env_logger (`RUST_LOG`,
//! default `info`), writes to stderr and `<config dir>/studioboard/logs/server.log`,
//! and keeps the most recent entries for `/logs` and `/logs/stream`.
use env_logger::Logger;
use log::{Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

const MAX_LOG_ENTRIES: usize = 2000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    fn now(level: &str, target: &str, message: String) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            level: level.to_string(),
            target: target.to_string(),
            message,
        }
    }

    fn line(&self) -> String {
        format!(
            "{} {:<5} {} {}\n",
            self.timestamp_ms,
            self.level.to_uppercase(),
            self.target,
            self.message.replace('\n', "\\n")
        )
    }
}

/// Ring buffer, broadcast channel and log file behind one value.
struct LogSink {
    recent: Mutex<VecDeque<LogEntry>>,
    tx: broadcast::Sender<LogEntry>,
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogSink {
    fn new(path: PathBuf) -> Self {
        let (tx, _) = broadcast::channel(512);
        let file = open_append(&path).ok();
        Self {
            recent: Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)),
            tx,
            path,
            file: Mutex::new(file),
        }
    }

    fn record(&self, entry: LogEntry) {
        self.append_to_file(&entry);
        {
            let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
            if recent.len() == MAX_LOG_ENTRIES {
                recent.pop_front();
            }
            recent.push_back(entry.clone());
        }
        let _ = self.tx.send(entry);
    }

    fn append_to_file(&self, entry: &LogEntry) {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = open_append(&self.path).ok();
        }
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(entry.line().as_bytes());
        }
    }

    fn snapshot(&self) -> Vec<LogEntry> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

static SINK: LazyLock<LogSink> =
    LazyLock::new(|| LogSink::new(crate::config::config_dir().join("logs").join("server.log")));

struct BridgeLogger {
    inner: Logger,
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        SINK.record(LogEntry::now(
            &record.level().to_string().to_lowercase(),
            record.target(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init() -> Result<(), SetLoggerError> {
    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .build();
    let max_level = inner.filter();
    log::set_boxed_logger(Box::new(BridgeLogger { inner }))?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn recent_entries() -> Vec<LogEntry> {
    SINK.snapshot()
}

pub fn subscribe() -> broadcast::Receiver<LogEntry> {
    SINK.tx.subscribe()
}

pub fn log_file_path() -> String {
    SINK.path.display().to_string()
}

/// Record a line when the logger itself could not be installed.
pub fn write_fallback_line(message: &str) {
    eprintln!("{}", message);
    SINK.record(LogEntry::now("error", "studioboard.log_bridge", message.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_keeps_recent_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("server.log");
        let sink = LogSink::new(path.clone());
        let mut rx = sink.tx.subscribe();

        sink.record(LogEntry::now("info", "test", "line 0".to_string()));
        assert_eq!(rx.try_recv().unwrap().message, "line 0");
        for i in 1..(MAX_LOG_ENTRIES + 5) {
            sink.record(LogEntry::now("info", "test", format!("line {}", i)));
        }
        let recent = sink.snapshot();
        assert_eq!(recent.len(), MAX_LOG_ENTRIES);
        assert_eq!(recent[0].message, "line 5");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO  test line 0"));
        assert_eq!(content.lines().count(), MAX_LOG_ENTRIES + 5);
    }

    #[test]
    fn test_multiline_messages_stay_on_one_line() {
        let entry = LogEntry::now("warn", "t", "a\nb".to_string());
        assert!(entry.line().ends_with("a\\nb\n"));
    }
}
