//! Lifecycle journal
//!
//! `<state_dir>/journal.log` holds one JSON object per settled install or
//! activation, oldest first, so a deploy history can be reconstructed after
//! the fact with `jq`. The journal is an observer: losing an entry never
//! changes the outcome of the event it describes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Serialize)]
struct JournalEntry<'a> {
    timestamp: DateTime<Utc>,
    event: &'a str,
    data: &'a Value,
}

/// Append-only event log; `None` when journaling is switched off
pub struct Journal {
    log: Option<PathBuf>,
}

impl Journal {
    pub fn new(enabled: bool, path: PathBuf) -> Self {
        Self {
            log: enabled.then_some(path),
        }
    }

    /// Append `event` with its payload
    pub async fn record(&self, event: &str, data: &Value) {
        let Some(log) = &self.log else {
            return;
        };

        let entry = JournalEntry {
            timestamp: Utc::now(),
            event,
            data,
        };
        let result = match serde_json::to_vec(&entry) {
            Ok(mut line) => {
                line.push(b'\n');
                append_line(log, &line).await
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            warn!("Lifecycle event {} not journaled: {}", event, e);
        }
    }
}

async fn append_line(log: &Path, line: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = log.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(log).await?;
    file.write_all(line).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn read_events(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn install_then_activate_history() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("state").join("journal.log");
        let journal = Journal::new(true, log.clone());

        journal
            .record("install.completed", &json!({"generation": "v2", "entries": 9}))
            .await;
        journal
            .record("activate.completed", &json!({"generation": "v2", "deleted": ["v1"]}))
            .await;

        let events = read_events(&log);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "install.completed");
        assert_eq!(events[0]["data"]["entries"], 9);
        assert_eq!(events[1]["data"]["deleted"][0], "v1");
        assert!(events[1]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn disabled_journal_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("journal.log");
        let journal = Journal::new(false, log.clone());

        journal.record("install.failed", &json!({"generation": "v1"})).await;

        assert!(!log.exists());
    }

    #[tokio::test]
    async fn unwritable_log_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        // A directory where the log file should be
        let log = temp.path().join("journal.log");
        std::fs::create_dir(&log).unwrap();

        Journal::new(true, log.clone())
            .record("activate.failed", &json!({}))
            .await;

        assert!(log.is_dir());
    }
}
