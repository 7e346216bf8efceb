//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::warn;

use tracau_scrap::{
    CrawlConfig, WordListFormat, DEFAULT_ENDPOINT, DEFAULT_ERROR_LOG, DEFAULT_HEADWORD_LIMIT,
    DEFAULT_OUTPUT, DEFAULT_WORD_LIST,
};

/// Scrape English-Vietnamese dictionary entries into a resumable JSON dataset.
#[derive(Parser, Debug)]
#[command(name = "tracau-scrap")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up the words of a word list and add them to the dataset
    Crawl(CrawlArgs),
    /// Extract headwords from a plain-text dictionary dump into a word list
    ExtractWords(ExtractArgs),
}

#[derive(clap::Args, Debug)]
pub struct CrawlArgs {
    /// Number of words to process (default: every remaining word)
    pub limit: Option<usize>,

    /// Position in the remaining words to start from
    #[arg(default_value_t = 0)]
    pub start: usize,

    /// Lookups in flight at once (1-500)
    #[arg(default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..=500))]
    pub concurrency: u16,

    /// Word list to read
    #[arg(short, long, default_value = DEFAULT_WORD_LIST)]
    pub words: PathBuf,

    /// Word list format, json or txt (default: guessed from the file extension)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Dataset file, read to resume and rewritten at every checkpoint
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// File that collects words which could not be fetched
    #[arg(long, default_value = DEFAULT_ERROR_LOG)]
    pub error_log: PathBuf,

    /// Lookup URL template, {word} is replaced by the encoded word
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// One word at a time with pauses in between, ignoring CONCURRENCY
    #[arg(long)]
    pub sequential: bool,

    /// Start from an empty dataset instead of the existing output file
    #[arg(long)]
    pub no_resume: bool,

    /// Give up on a single request after this many seconds (default: no limit)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl CrawlArgs {
    pub fn config(&self) -> CrawlConfig {
        let mut config = if self.sequential {
            CrawlConfig::sequential()
        } else {
            CrawlConfig {
                concurrent_limit: usize::from(self.concurrency),
                ..CrawlConfig::concurrent()
            }
        };
        config.request_timeout = self.timeout.map(Duration::from_secs);
        config
    }

    /// The `--format` given, or the one implied by the word list's extension.
    ///
    /// An unknown format is logged and yields `None`: the run then has no words to process.
    pub fn word_list_format(&self) -> Option<WordListFormat> {
        let Some(name) = &self.format else {
            return Some(WordListFormat::from_path(&self.words));
        };
        match name.parse() {
            Ok(format) => Some(format),
            Err(err) => {
                warn!(path = %self.words.display(), "{err}");
                None
            }
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Dictionary dump with one `@headword /phonetic/` line per entry
    pub dictionary: PathBuf,

    /// Maximum number of headwords (0 for all)
    #[arg(short, long, default_value_t = DEFAULT_HEADWORD_LIMIT)]
    pub limit: usize,

    /// Output path without extension; both .json and .txt are written
    #[arg(short, long, default_value = "word_list")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawl_args(argv: &[&str]) -> CrawlArgs {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Crawl(crawl) => crawl,
            other => panic!("expected crawl, got {other:?}"),
        }
    }

    #[test]
    fn crawl_defaults() {
        let crawl = crawl_args(&["tracau-scrap", "crawl"]);
        assert_eq!(crawl.limit, None);
        assert_eq!(crawl.start, 0);
        assert_eq!(crawl.concurrency, 50);
        assert_eq!(crawl.words, PathBuf::from(DEFAULT_WORD_LIST));
        assert_eq!(crawl.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!crawl.sequential);
        assert_eq!(crawl.config(), CrawlConfig::concurrent());
    }

    #[test]
    fn crawl_positionals_are_limit_start_concurrency() {
        let crawl = crawl_args(&["tracau-scrap", "crawl", "100", "20", "8"]);
        assert_eq!(crawl.limit, Some(100));
        assert_eq!(crawl.start, 20);
        assert_eq!(crawl.config().concurrent_limit, 8);
    }

    #[test]
    fn concurrency_zero_rejected() {
        let err = Args::try_parse_from(["tracau-scrap", "crawl", "10", "0", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn sequential_flag_selects_sequential_config() {
        let crawl = crawl_args(&["tracau-scrap", "crawl", "--sequential", "--timeout", "30"]);
        let config = crawl.config();
        assert_eq!(config.concurrent_limit, 1);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn word_list_format_from_flag_or_extension() {
        let crawl = crawl_args(&["tracau-scrap", "crawl"]);
        assert_eq!(crawl.word_list_format(), Some(WordListFormat::Json));

        let crawl = crawl_args(&["tracau-scrap", "crawl", "-w", "words.txt"]);
        assert_eq!(crawl.word_list_format(), Some(WordListFormat::Text));

        let crawl = crawl_args(&["tracau-scrap", "crawl", "-w", "words.txt", "-f", "json"]);
        assert_eq!(crawl.word_list_format(), Some(WordListFormat::Json));
    }

    #[test]
    fn unknown_word_list_format_gives_no_format() {
        let crawl = crawl_args(&["tracau-scrap", "crawl", "-w", "words.js", "-f", "js"]);
        assert_eq!(crawl.word_list_format(), None);
    }

    #[test]
    fn global_verbosity_after_subcommand() {
        let args = Args::try_parse_from(["tracau-scrap", "crawl", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(!args.quiet);
    }

    #[test]
    fn extract_words_defaults() {
        let args = Args::try_parse_from(["tracau-scrap", "extract-words", "anhviet109K.txt"]).unwrap();
        let Command::ExtractWords(extract) = args.command else {
            panic!("expected extract-words");
        };
        assert_eq!(extract.dictionary, PathBuf::from("anhviet109K.txt"));
        assert_eq!(extract.limit, DEFAULT_HEADWORD_LIMIT);
        assert_eq!(extract.output, PathBuf::from("word_list"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["tracau-scrap"]).is_err());
    }
}
