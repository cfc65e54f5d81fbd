use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ENTRY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]+)\]\s*(.*)$").expect("valid entry regex"));

/// Display level guessed from an entry's first line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryLevel {
    Error,
    Warning,
    Event,
    Message,
    Info,
}

impl EntryLevel {
    pub fn classify(message: &str) -> Self {
        let upper = message.to_uppercase();
        if upper.contains("ERROR") || upper.contains("FAILED") {
            EntryLevel::Error
        } else if upper.contains("WARN") {
            EntryLevel::Warning
        } else if upper.contains("EVENT") || message.contains("***") {
            EntryLevel::Event
        } else if message.contains(">>>") || message.contains("<<<") {
            EntryLevel::Message
        } else {
            EntryLevel::Info
        }
    }
}

/// One timestamped record, possibly spanning several physical lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    pub level: EntryLevel,
}

impl LogEntry {
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Rebuild logical entries from raw log text.
///
/// Lines without a `[timestamp]` prefix continue the previous entry; any
/// such lines before the first entry are dropped.
pub fn parse_entries(text: &str) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = ENTRY_START.captures(line) {
            let message = caps[2].to_string();
            entries.push(LogEntry {
                timestamp: caps[1].trim().to_string(),
                level: EntryLevel::classify(&message),
                message,
            });
        } else if let Some(last) = entries.last_mut() {
            last.message.push('\n');
            last.message.push_str(line);
        }
    }

    entries
}
