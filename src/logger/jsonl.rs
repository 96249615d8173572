//! JSONL diagnostics log: append-only line-delimited JSON.
//!
//! Each line is a self-contained JSON object, written with a single
//! `write_all` call so a process tailing the file never sees a partial line.
//! There is no buffering; low event volume makes one write per line cheap and
//! a crashing process loses nothing.
//!
//! Degradation chain: primary file → stderr (with one notice) → silent
//! discard. Diagnostics must never take down the engine.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity level for diagnostics events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Event types emitted by the view engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The dataset arrived and the view became ready.
    DatasetLoaded,
    /// The dataset fetch or decode failed.
    DatasetFetch,
    /// A metric carried a status outside the closed set.
    UnknownStatus,
    /// A persisted state slice was absent or corrupt at rehydration.
    StateLoad,
    /// A persistence write failed; the in-memory state still advanced.
    StateWrite,
    /// A history fetch resolved or failed.
    HistoryFetch,
}

/// A single JSONL entry — `ts`, `event` and `severity` always present,
/// everything else omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC timestamp, RFC 3339 with millisecond precision.
    pub ts: String,
    /// Event type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Affected metric id, when the event concerns one row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Storage key, for persistence events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Whether the operation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Item count, for load summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            metric: None,
            key: None,
            details: None,
            ok: None,
            count: None,
        }
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Writing to the log file.
    Normal,
    /// File unavailable, writing to stderr.
    Stderr,
    /// stderr failed too, silently discarding.
    Discard,
}

/// Append-only JSONL writer with a stderr/discard fallback.
pub struct JsonlWriter {
    path: PathBuf,
    file: Option<File>,
    state: WriterState,
}

impl JsonlWriter {
    /// Open the log file for appending, creating parent directories as
    /// needed. Failure degrades to stderr with one notice.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match open_append(&path) {
            Ok(file) => Self {
                path,
                file: Some(file),
                state: WriterState::Normal,
            },
            Err(err) => {
                let _ = writeln!(
                    io::stderr(),
                    "[QRV-LOG] cannot open {}: {err}; logging to stderr",
                    path.display()
                );
                Self {
                    path,
                    file: None,
                    state: WriterState::Stderr,
                }
            }
        }
    }

    /// Write a single entry as one atomic JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(err) => {
                let _ = writeln!(io::stderr(), "[QRV-LOG] serialize error: {err}");
            }
        }
    }

    /// Current degradation state, for diagnostics of the diagnostics.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Path the writer was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal => {
                let failed = match self.file.as_mut() {
                    Some(file) => file.write_all(line.as_bytes()).is_err(),
                    None => true,
                };
                if failed {
                    self.file = None;
                    self.state = WriterState::Stderr;
                    let _ = writeln!(
                        io::stderr(),
                        "[QRV-LOG] write to {} failed; logging to stderr",
                        self.path.display()
                    );
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[QRV-LOG] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }
}

/// Shared diagnostics handle: cheap to clone, safe to use from the fetch
/// workers and the consumer alike. The default handle discards everything.
#[derive(Clone, Default)]
pub struct DiagnosticsLog {
    writer: Option<Arc<Mutex<JsonlWriter>>>,
}

impl DiagnosticsLog {
    /// A handle that drops every entry. Used when no log path is configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open a shared writer at `path`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(JsonlWriter::open(path)))),
        }
    }

    /// Whether entries go anywhere at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Record one entry.
    pub fn record(&self, entry: &LogEntry) {
        if let Some(writer) = &self.writer {
            writer.lock().write_entry(entry);
        }
    }
}

// ──────────────────── helpers ────────────────────

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Format current UTC time as RFC 3339.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────── tests ────────────────────
