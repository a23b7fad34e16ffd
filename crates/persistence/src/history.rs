//! Turn history log
//!
//! One record per completed turn, schema `{session_id, sequence,
//! timestamp, input_lang, intent, backend_used, fallback_occurred,
//! response_lang}`. The file implementation writes JSON lines so appends
//! are atomic per record and the file never needs rewriting.

use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use polyglot_core::TurnRecord;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only sink for completed turn records
#[async_trait]
pub trait TurnSink: Send + Sync {
    /// Append one record; called exactly once per completed turn
    async fn append(&self, record: &TurnRecord) -> Result<()>;

    /// Load records in append order, optionally filtered to one session
    async fn load(&self, session_id: Option<&str>) -> Result<Vec<TurnRecord>>;
}

/// JSON-lines file log
pub struct FileTurnLog {
    path: PathBuf,
    // serializes appends so concurrent sessions never interleave a record
    write_lock: tokio::sync::Mutex<()>,
}

impl FileTurnLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl TurnSink for FileTurnLog {
    async fn append(&self, record: &TurnRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load(&self, session_id: Option<&str>) -> Result<Vec<TurnRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TurnRecord>(line) {
                Ok(record) => {
                    if session_id.map_or(true, |id| record.session_id == id) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    // a torn write must not poison the rest of the log
                    tracing::warn!(line = number + 1, error = %e, "skipping unreadable history record");
                }
            }
        }
        Ok(records)
    }
}

/// In-memory log for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryTurnLog {
    records: RwLock<Vec<TurnRecord>>,
}

impl MemoryTurnLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnSink for MemoryTurnLog {
    async fn append(&self, record: &TurnRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn load(&self, session_id: Option<&str>) -> Result<Vec<TurnRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| session_id.map_or(true, |id| r.session_id == id))
            .cloned()
            .collect())
    }
}
