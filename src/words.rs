//! Word lists: loading them, saving them, and deciding what still needs a lookup.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::model::ResultSet;
use crate::{Error, Result};

/// On-disk encoding of a word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordListFormat {
    /// A JSON array of strings.
    Json,
    /// One word per line.
    Text,
}

impl WordListFormat {
    /// Guesses the format from the file extension, `.txt` meaning text and anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt") => WordListFormat::Text,
            _ => WordListFormat::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            WordListFormat::Json => "json",
            WordListFormat::Text => "txt",
        }
    }
}

impl FromStr for WordListFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(WordListFormat::Json),
            "txt" | "text" => Ok(WordListFormat::Text),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for WordListFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reads a word list stored as `format`. Unreadable files and malformed JSON are errors.
pub async fn read_word_list(path: &Path, format: WordListFormat) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    let words = parse_word_list(&content, format)?;
    info!(path = %path.display(), words = words.len(), "read word list");
    Ok(words)
}

/// Parses a word list, dropping blank entries and repeats (first occurrence wins).
pub fn parse_word_list(content: &str, format: WordListFormat) -> Result<Vec<String>> {
    let raw: Vec<String> = match format {
        WordListFormat::Json => serde_json::from_str(content)?,
        WordListFormat::Text => content.lines().map(str::to_string).collect(),
    };

    let mut seen = HashSet::new();
    Ok(raw
        .into_iter()
        .map(|word| word.trim().to_string())
        .filter(|word| !word.is_empty())
        .filter(|word| seen.insert(word.clone()))
        .collect())
}

pub async fn save_word_list(path: &Path, words: &[String], format: WordListFormat) -> Result<()> {
    let content = match format {
        WordListFormat::Json => serde_json::to_string_pretty(words)?,
        WordListFormat::Text => words.join("\n"),
    };
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), words = words.len(), "saved word list");
    Ok(())
}

/// Words that have no entry in `existing` yet, each once, in their original order.
pub fn pending_words(words: &[String], existing: &ResultSet) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for word in words {
        if !existing.contains_key(word) && seen.insert(word.as_str()) {
            pending.push(word.clone());
        }
    }
    pending
}

/// Skips `start` words, then keeps at most `limit` (all of them when `limit` is `None`).
pub fn select_window(words: Vec<String>, start: usize, limit: Option<usize>) -> Vec<String> {
    words
        .into_iter()
        .skip(start)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Pulls headwords out of a plain-text dictionary dump.
///
/// Entries start with `@headword /phonetic/`; the phonetic part is dropped.
/// A `limit` of 0 means no limit.
pub fn extract_headwords(dictionary: &str, limit: usize) -> Vec<String> {
    let mut words = Vec::new();
    for line in dictionary.lines() {
        let Some(entry) = line.strip_prefix('@') else {
            continue;
        };
        let headword = entry.split('/').next().unwrap_or_default().trim();
        if headword.is_empty() {
            continue;
        }
        words.push(headword.to_string());
        if limit > 0 && words.len() >= limit {
            break;
        }
    }
    words
}
