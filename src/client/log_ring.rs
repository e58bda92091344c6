use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;

pub use crate::simulation::fragment::LogEntry;

pub const LOG_CAPACITY: usize = 12;

fn server_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[(.+?)\]\s*(.*)$").expect("static log line pattern"))
}

/// Splits `[ts] message`; lines without the prefix are stamped with `fallback_ts`.
pub fn parse_server_line(line: &str, fallback_ts: &str) -> LogEntry {
    match server_line_pattern().captures(line) {
        Some(caps) => LogEntry::new(&caps[1], &caps[2]),
        None => LogEntry::new(fallback_ts, line),
    }
}

/// The 12 most recent entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LogEntry>", into = "Vec<LogEntry>")]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
}

impl From<Vec<LogEntry>> for LogRing {
    fn from(mut entries: Vec<LogEntry>) -> Self {
        entries.truncate(LOG_CAPACITY);
        Self {
            entries: entries.into(),
        }
    }
}

impl From<LogRing> for Vec<LogEntry> {
    fn from(ring: LogRing) -> Self {
        ring.entries.into()
    }
}

impl LogRing {
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(LOG_CAPACITY);
    }

    pub fn push_text(&mut self, ts: impl Into<String>, text: impl Into<String>) {
        self.push(LogEntry::new(ts, text));
    }

    /// Replaces the ring with a step's stderr lines (oldest first on the wire).
    /// Empty input leaves the ring alone.
    pub fn replace_with_server_lines(&mut self, lines: &[String], fallback_ts: &str) -> bool {
        if lines.is_empty() {
            return false;
        }
        self.entries = lines
            .iter()
            .rev()
            .take(LOG_CAPACITY)
            .map(|line| parse_server_line(line, fallback_ts))
            .collect();
        true
    }

    /// Replaces the ring with chronological entries from a state fragment.
    pub fn replace_with_entries(&mut self, entries: &[LogEntry]) -> bool {
        if entries.is_empty() {
            return false;
        }
        self.entries = entries.iter().rev().take(LOG_CAPACITY).cloned().collect();
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
