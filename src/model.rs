//! Data shapes shared by the extractor, the crawler and the store.
//!
//! [`DictionaryRecord`] and friends serialize to the dataset layout written to disk.
//! [`RawLookupResponse`] is the lookup API's body, decoded leniently so that an
//! unexpected shape degrades to empty sections instead of failing the word.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accumulated dataset, keyed by the word as it was supplied.
pub type ResultSet = BTreeMap<String, DictionaryRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryRecord {
    pub word: String,
    pub phonetic: String,
    pub definition: Definition,
    pub terms: Terms,
    pub examples: Vec<Example>,
}

impl DictionaryRecord {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    /// Part of speech, as printed by the source dictionary.
    #[serde(rename = "type")]
    pub kind: String,
    pub basic_meanings: Vec<String>,
    pub phrases: Vec<Phrase>,
}

impl Definition {
    /// Adds meanings for `phrase`, merging into an existing entry with the same text.
    ///
    /// A new entry keeps the position of its first occurrence. Empty `meanings` are ignored.
    pub fn upsert_phrase(&mut self, phrase: &str, meanings: Vec<String>) {
        if let Some(existing) = self.phrases.iter_mut().find(|p| p.phrase == phrase) {
            existing.meaning.merge(meanings);
            return;
        }
        if let Some(meaning) = PhraseMeaning::from_meanings(meanings) {
            self.phrases.push(Phrase {
                phrase: phrase.to_string(),
                meaning,
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub phrase: String,
    #[serde(flatten)]
    pub meaning: PhraseMeaning,
}

/// Serializes as a `meaning` key while only one meaning is known, `meanings` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhraseMeaning {
    #[serde(rename = "meaning")]
    Single(String),
    #[serde(rename = "meanings")]
    Multiple(Vec<String>),
}

impl PhraseMeaning {
    /// Builds the variant from freshly discovered meanings, dropping exact repeats.
    pub fn from_meanings(meanings: Vec<String>) -> Option<Self> {
        let mut iter = meanings.into_iter();
        let mut merged = PhraseMeaning::Single(iter.next()?);
        merged.merge(iter);
        Some(merged)
    }

    pub fn meanings(&self) -> &[String] {
        match self {
            PhraseMeaning::Single(meaning) => std::slice::from_ref(meaning),
            PhraseMeaning::Multiple(meanings) => meanings,
        }
    }

    /// Appends every meaning not already present. `Single` turns into `Multiple`
    /// only when a second distinct meaning arrives.
    pub fn merge<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = String>,
    {
        for meaning in incoming {
            if self.meanings().contains(&meaning) {
                continue;
            }
            match self {
                PhraseMeaning::Single(first) => {
                    let first = std::mem::take(first);
                    *self = PhraseMeaning::Multiple(vec![first, meaning]);
                }
                PhraseMeaning::Multiple(meanings) => meanings.push(meaning),
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Terms {
    pub economic: Vec<EconomicTerm>,
    pub technical: Vec<TechnicalTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicTerm {
    pub term: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalTerm {
    pub term: String,
    pub field: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub en: String,
    pub vi: String,
}

/// Body of a lookup call: bilingual `sentences` plus the `tratu` entries whose
/// first element carries the dictionary markup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLookupResponse {
    #[serde(deserialize_with = "lenient_seq")]
    pub sentences: Vec<Sentence>,
    #[serde(deserialize_with = "lenient_seq")]
    pub tratu: Vec<TratuEntry>,
}

impl RawLookupResponse {
    /// Decodes a lookup body. Only invalid JSON is an error; a valid document with an
    /// unexpected shape yields `None` so the caller can log it and carry on with an empty response.
    pub fn from_json(body: &str) -> serde_json::Result<Option<Self>> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Ok(None);
        }
        Ok(serde_json::from_value(value).ok())
    }

    /// The markup blob of the first dictionary entry, if the response has one.
    pub fn markup(&self) -> Option<&str> {
        self.tratu
            .first()?
            .fields
            .as_ref()?
            .fulltext
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sentence {
    pub fields: Option<SentenceFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SentenceFields {
    #[serde(deserialize_with = "lenient_text")]
    pub en: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub vi: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TratuEntry {
    pub fields: Option<TratuFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TratuFields {
    pub fulltext: Option<String>,
}

/// Accepts any JSON value: a non-array becomes empty and a malformed element becomes its default.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts any JSON value: anything but a string becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}
