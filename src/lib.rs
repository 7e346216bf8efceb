//! English-Vietnamese dictionary scraper.
//!
//! Looks words up on the tracau.vn API, scrapes the structured entry out of the JSON and
//! embedded markup, and accumulates a JSON dataset keyed by word that can be resumed.

mod error;
mod macros;
pub mod model;
pub mod parse;
pub mod process;
pub mod request;
pub mod retry;
pub mod store;
pub mod words;

pub use error::{Error, Result};
pub use model::{DictionaryRecord, PhraseMeaning, RawLookupResponse, ResultSet};
pub use parse::extract_record;
pub use process::{CrawlConfig, CrawlOutcome, CrawlStats, Crawler, DatasetSummary, DutyCycle};
pub use request::{LookupClient, TracauClient};
pub use retry::{RetryPolicy, DEFAULT_RETRY_LIMIT};
pub use store::{ErrorLog, ResultStore};
pub use words::WordListFormat;

/// Lookup URL template, `{word}` is replaced by the percent-encoded word.
pub const DEFAULT_ENDPOINT: &str = "https://api.tracau.vn/WBBcwnwQpV89/s/{word}/en";
pub const DEFAULT_WORD_LIST: &str = "word_list.json";
pub const DEFAULT_OUTPUT: &str = "anhviet_dictionary_data.json";
pub const DEFAULT_ERROR_LOG: &str = "crawler_errors.log";
/// Headwords taken from a dictionary dump when no limit is given.
pub const DEFAULT_HEADWORD_LIMIT: usize = 1000;
