//! Translation log
//!
//! Plain-text append log, one line per translation:
//! `src -> tgt | original => translated`. Reads return newest entries
//! first, which is how the history view presents them.

use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use polyglot_core::Language;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// One logged translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationEntry {
    pub original: String,
    pub translated: String,
    /// Source code, or "auto-detected" when the backend resolved it
    pub source: String,
    pub target: Language,
}

impl TranslationEntry {
    fn to_line(&self) -> String {
        format!(
            "{} -> {} | {} => {}\n",
            self.source,
            self.target.code(),
            self.original.replace('\n', " "),
            self.translated.replace('\n', " ")
        )
    }
}

/// Append-only sink for completed translations
#[async_trait]
pub trait TranslationSink: Send + Sync {
    async fn append(&self, entry: &TranslationEntry) -> Result<()>;

    /// Most recent `limit` lines, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<String>>;
}

/// Plain-text file log
pub struct FileTranslationLog {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileTranslationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl TranslationSink for FileTranslationLog {
    async fn append(&self, entry: &TranslationEntry) -> Result<()> {
        let line = entry.to_line();
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

    async fn recent(&self, limit: usize) -> Result<Vec<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .rev()
            .take(limit)
            .map(str::to_string)
            .collect())
    }
}

/// In-memory log for tests
#[derive(Default)]
pub struct MemoryTranslationLog {
    lines: RwLock<Vec<String>>,
}

impl MemoryTranslationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranslationSink for MemoryTranslationLog {
    async fn append(&self, entry: &TranslationEntry) -> Result<()> {
        self.lines
            .write()
            .push(entry.to_line().trim_end().to_string());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .lines
            .read()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(original: &str, translated: &str) -> TranslationEntry {
        TranslationEntry {
            original: original.to_string(),
            translated: translated.to_string(),
            source: "auto-detected".to_string(),
            target: Language::Hindi,
        }
    }

    #[tokio::test]
    async fn test_file_log_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileTranslationLog::new(dir.path().join("translations.txt"));
        log.append(&entry("good morning", "suprabhat")).await.unwrap();
        log.append(&entry("thank you", "dhanyavad")).await.unwrap();

        let lines = log.recent(10).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("thank you"));
        assert!(lines[1].contains("good morning"));
        assert!(lines[0].starts_with("auto-detected -> hi |"));
    }

    #[tokio::test]
    async fn test_file_log_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileTranslationLog::new(dir.path().join("data/translations.txt"));
        log.append(&entry("good morning", "suprabhat")).await.unwrap();
        assert_eq!(log.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let log = MemoryTranslationLog::new();
        for i in 0..5 {
            log.append(&entry(&format!("line {}", i), "x")).await.unwrap();
        }
        let lines = log.recent(2).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("line 4"));
    }
}
