//! Durable state of a crawl: the dataset file and the failure log.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::model::ResultSet;
use crate::Result;

/// Reads and writes the [`ResultSet`] as a pretty-printed JSON object keyed by word.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous run's dataset. A missing or unreadable file means starting over.
    pub async fn load(&self) -> ResultSet {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) => {
                info!(path = %self.path.display(), "no previous data ({err}), starting from scratch");
                return ResultSet::new();
            }
        };
        match serde_json::from_str::<ResultSet>(&content) {
            Ok(results) => {
                info!(path = %self.path.display(), words = results.len(), "found previous data");
                results
            }
            Err(err) => {
                warn!(path = %self.path.display(), "previous data is corrupt ({err}), starting from scratch");
                ResultSet::new()
            }
        }
    }

    /// Writes the dataset next to the target and renames it into place, so a crash mid-write
    /// leaves the previous checkpoint intact.
    pub async fn save(&self, results: &ResultSet) -> Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), words = results.len(), "saved results");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Appends one line per word that could not be fetched.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, word: &str, message: &str) -> Result<()> {
        let line = format_failure(
            &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            word,
            message,
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn format_failure(timestamp: &str, word: &str, message: &str) -> String {
    format!("{timestamp} - \"{word}\": {message}\n")
}
