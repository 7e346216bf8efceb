//! Turns a raw lookup response into a [`DictionaryRecord`].
//!
//! The dictionary markup is a third-party HTML dialect with no published contract, so every
//! field is pulled out by a literal pattern (and, for some sections, a fixed character window
//! measured from a marker). Each rule is a separate function over the markup string.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{
    DictionaryRecord, EconomicTerm, Example, Phrase, PhraseMeaning, RawLookupResponse, Sentence,
    TechnicalTerm,
};

/// Characters after a phrase row that are searched for its meanings.
pub const PHRASE_WINDOW: usize = 300;
/// Characters after [`ECONOMIC_MARKER`] that make up the economic section.
pub const ECONOMIC_WINDOW: usize = 3000;
/// Characters after [`TECHNICAL_MARKER`] that make up the technical section.
pub const TECHNICAL_WINDOW: usize = 2000;

pub const ECONOMIC_MARKER: &str = "Từ điển Kinh tế";
pub const TECHNICAL_MARKER: &str = "Từ điển Kỹ thuật";

// Static patterns, safe to panic
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("<em>|</em>").expect("emphasis regex is valid"));
static PHONETIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<font color="#9e9e9e">\[(.*?)\]</font>"##).expect("phonetic regex is valid")
});
static PART_OF_SPEECH_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<b><font color="#1a76bf">([^<]+)</font></b>"##)
        .expect("bold part-of-speech regex is valid")
});
static PART_OF_SPEECH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<font color="#1a76bf">([^<]+)</font>"##).expect("part-of-speech regex is valid")
});
static BASIC_MEANING_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<td id="I_C"><font color="#999">■</font></td><td id="C_C" colspan="2">([^<]+)</td>"##)
        .expect("basic meaning regex is valid")
});
static PHRASE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<td id="I_C"><font color="#1371BB">▸</font></td><td id="C_C" colspan="2"><font color="#1371BB">([^<]+)</font>"##)
        .expect("phrase row regex is valid")
});
static PHRASE_MEANING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<td id="C_C">([^<]+)</td>"##).expect("phrase meaning regex is valid")
});
static ECONOMIC_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<font color="#005ba1">([^<]+)</font><font color="#282828">: ([^<]+)</font>"##)
        .expect("economic term regex is valid")
});
static TECHNICAL_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<font color="#666699">([^<]+)</font>"##).expect("technical field regex is valid")
});
static TECHNICAL_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"(?s)<font color="#005ba1">([^<]+)</font>.*?<font> ([^<]+)</font>"##)
        .expect("technical term regex is valid")
});
static LEADING_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^■\s*").expect("bullet regex is valid"));

/// Builds the record for `word`. Never fails: whatever cannot be found stays empty.
pub fn extract_record(response: &RawLookupResponse, word: &str) -> DictionaryRecord {
    let mut record = DictionaryRecord::new(word);
    let needle = word.to_lowercase();

    scan_sentences(&response.sentences, &needle, &mut record);
    if let Some(html) = response.markup() {
        scan_markup(html, &needle, &mut record);
    }
    record
}

fn scan_sentences(sentences: &[Sentence], needle: &str, record: &mut DictionaryRecord) {
    let pairs: Vec<(String, Option<&str>)> = sentences
        .iter()
        .filter_map(|sentence| sentence.fields.as_ref())
        .filter_map(|fields| {
            let en = fields.en.as_deref()?;
            Some((clean_sentence(en), fields.vi.as_deref()))
        })
        .collect();

    // Only the first exact match counts, even when it has no translation.
    if let Some((_, vi)) = pairs.iter().find(|(en, _)| en.to_lowercase() == needle) {
        if let Some(vi) = vi.filter(|vi| !vi.is_empty()) {
            record.definition.basic_meanings.push(vi.to_string());
        }
    }

    for (en, vi) in pairs {
        let lower = en.to_lowercase();
        if lower == needle || !lower.contains(needle) {
            continue;
        }
        let Some(vi) = vi else { continue };

        if is_example_sentence(&en) {
            record.examples.push(Example {
                en,
                vi: vi.to_string(),
            });
        } else {
            record.definition.phrases.push(Phrase {
                phrase: en,
                meaning: PhraseMeaning::Single(vi.to_string()),
            });
        }
    }
}

fn scan_markup(html: &str, needle: &str, record: &mut DictionaryRecord) {
    if let Some(phonetic) = phonetic(html) {
        record.phonetic = phonetic;
    }
    if let Some(kind) = part_of_speech(html) {
        record.definition.kind = kind;
    }
    if record.definition.basic_meanings.is_empty() {
        record.definition.basic_meanings = basic_meanings(html);
    }

    for (phrase, meanings) in phrase_rows(html) {
        if phrase.to_lowercase() == needle {
            continue;
        }
        record.definition.upsert_phrase(&phrase, meanings);
    }

    record.terms.economic = economic_terms(html);
    record.terms.technical = technical_terms(html);
}

/// Strips `<em>` emphasis and surrounding whitespace from an English sentence.
pub fn clean_sentence(en: &str) -> String {
    EMPHASIS.replace_all(en, "").trim().to_string()
}

/// Punctuated text, or text opening with "I " / "THE ", is a usage example rather than a phrase.
pub fn is_example_sentence(en: &str) -> bool {
    en.contains(['.', '?', '!']) || en.starts_with("I ") || en.starts_with("THE ")
}

/// Text inside the first grey `[...]`.
pub fn phonetic(html: &str) -> Option<String> {
    PHONETIC.captures(html).map(|caps| caps[1].to_string())
}

/// Bold blue label, falling back to the plain blue one.
pub fn part_of_speech(html: &str) -> Option<String> {
    PART_OF_SPEECH_BOLD
        .captures(html)
        .or_else(|| PART_OF_SPEECH.captures(html))
        .map(|caps| caps[1].to_string())
}

/// Every "■" row, minus cross references marked "(xem)".
pub fn basic_meanings(html: &str) -> Vec<String> {
    BASIC_MEANING_ROW
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .filter(|meaning| !meaning.contains("(xem)"))
        .map(|meaning| meaning.trim().to_string())
        .filter(|meaning| !meaning.is_empty())
        .collect()
}

/// Every "▸" phrase row with the meanings found in the [`PHRASE_WINDOW`] characters that
/// start at the row. Rows without any meaning are dropped.
pub fn phrase_rows(html: &str) -> Vec<(String, Vec<String>)> {
    PHRASE_ROW
        .captures_iter(html)
        .filter_map(|caps| {
            let row = caps.get(0)?;
            let phrase = caps[1].trim().to_string();
            if phrase.is_empty() {
                return None;
            }

            let context = char_window(html, row.start(), PHRASE_WINDOW);
            let meanings: Vec<String> = PHRASE_MEANING
                .captures_iter(context)
                .map(|m| m[1].trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();

            (!meanings.is_empty()).then_some((phrase, meanings))
        })
        .collect()
}

/// `term: meaning` pairs in the economic dictionary section.
pub fn economic_terms(html: &str) -> Vec<EconomicTerm> {
    let Some(section) = section(html, ECONOMIC_MARKER, ECONOMIC_WINDOW) else {
        return Vec::new();
    };
    ECONOMIC_TERM
        .captures_iter(section)
        .map(|caps| EconomicTerm {
            term: caps[1].trim().to_string(),
            meaning: caps[2].trim().to_string(),
        })
        .collect()
}

/// Term/meaning pairs in the technical dictionary section, all tagged with the section's
/// first field label.
pub fn technical_terms(html: &str) -> Vec<TechnicalTerm> {
    let Some(section) = section(html, TECHNICAL_MARKER, TECHNICAL_WINDOW) else {
        return Vec::new();
    };
    let field = TECHNICAL_FIELD
        .captures(section)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();

    TECHNICAL_TERM
        .captures_iter(section)
        .map(|caps| TechnicalTerm {
            term: caps[1].trim().to_string(),
            field: field.clone(),
            meaning: LEADING_BULLET.replace(caps[2].trim(), "").into_owned(),
        })
        .collect()
}

fn section<'a>(html: &'a str, marker: &str, len: usize) -> Option<&'a str> {
    html.find(marker).map(|start| char_window(html, start, len))
}

/// At most `len` characters of `text` starting at byte offset `start`.
fn char_window(text: &str, start: usize, len: usize) -> &str {
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .nth(len)
        .map_or(rest.len(), |(idx, _)| idx);
    &rest[..end]
}
