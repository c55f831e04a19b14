//! Durable append-only record of worked sessions

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StoreError;

/// One finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(rename = "date")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
}

/// Storage boundary for the work log
pub trait WorkLogStore: Send + Sync {
    /// All entries, newest first
    fn list(&self) -> Result<Vec<LogEntry>, StoreError>;

    /// Record `duration_seconds` of work finished at `occurred_at`
    fn append(&self, duration_seconds: u64, occurred_at: DateTime<Utc>) -> Result<LogEntry, StoreError>;
}

fn validate_duration(duration_seconds: u64) -> Result<(), StoreError> {
    if duration_seconds == 0 {
        return Err(StoreError::InvalidDuration(
            "duration must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

fn next_entry(entries: &[LogEntry], duration_seconds: u64, occurred_at: DateTime<Utc>) -> LogEntry {
    let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
    LogEntry {
        id,
        occurred_at,
        duration_seconds,
    }
}

fn newest_first(entries: &[LogEntry]) -> Vec<LogEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted
}

/// Work log kept in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkLogStore for MemoryStore {
    fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(newest_first(&entries))
    }

    fn append(&self, duration_seconds: u64, occurred_at: DateTime<Utc>) -> Result<LogEntry, StoreError> {
        validate_duration(duration_seconds)?;
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let entry = next_entry(&entries, duration_seconds, occurred_at);
        entries.push(entry.clone());
        Ok(entry)
    }
}

/// Work log persisted as a JSON array in a single file.
///
/// Each append rewrites the whole file through a temporary sibling and an
/// atomic rename, so a crash never leaves a half-written log behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Vec<LogEntry>>,
}

impl JsonFileStore {
    /// Open the log at `path`, creating parent directories as needed.
    /// A missing file is an empty log.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };

        info!("Opened work log at {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, entries: &[LogEntry]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, entries)?;
        temp.write_all(b"\n")?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!("Wrote {} work log entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl WorkLogStore for JsonFileStore {
    fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(newest_first(&entries))
    }

    fn append(&self, duration_seconds: u64, occurred_at: DateTime<Utc>) -> Result<LogEntry, StoreError> {
        validate_duration(duration_seconds)?;
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        let entry = next_entry(&entries, duration_seconds, occurred_at);
        let mut updated = entries.clone();
        updated.push(entry.clone());

        // Only publish the new entry in memory once it is on disk.
        self.write_atomic(&updated)?;
        *entries = updated;
        Ok(entry)
    }
}
