use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracau_scrap::words::{
    extract_headwords, pending_words, read_word_list, save_word_list, select_window,
};
use tracau_scrap::{
    info_time, Crawler, DatasetSummary, Error, ErrorLog, ResultSet, ResultStore, TracauClient,
    WordListFormat,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, CrawlArgs, ExtractArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!(?args, "CLI arguments parsed");

    let start_time = Local::now();
    match args.command {
        Command::Crawl(crawl) => crawl_words(crawl).await?,
        Command::ExtractWords(extract) => extract_words(extract).await?,
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}

async fn crawl_words(args: CrawlArgs) -> Result<()> {
    let words = match args.word_list_format() {
        Some(format) => read_word_list(&args.words, format)
            .await
            .with_context(|| format!("couldn't read word list {}", args.words.display()))?,
        None => Vec::new(),
    };
    if words.is_empty() {
        return Err(anyhow::Error::from(Error::EmptyWordList(args.words.clone()))
            .context("run `extract-words` first or point --words at a non-empty list"));
    }

    let store = ResultStore::new(&args.output);
    let existing = if args.no_resume {
        ResultSet::new()
    } else {
        store.load().await
    };

    let remaining = pending_words(&words, &existing);
    info!(
        listed = words.len(),
        remaining = remaining.len(),
        "words left to process"
    );
    let selected = select_window(remaining, args.start, args.limit);
    info!(
        selected = selected.len(),
        start = args.start,
        "words selected for this run"
    );

    let client = TracauClient::new(&args.endpoint);
    let crawler = Crawler::new(Arc::new(client), args.config())?
        .with_store(store)
        .with_error_log(ErrorLog::new(&args.error_log));

    let outcome = crawler.run(&selected, existing).await;

    let summary = DatasetSummary::of(&outcome.results);
    info!(
        total_words = summary.words,
        new_words = outcome.stats.processed,
        failed = outcome.stats.failed,
        retried = outcome.stats.retried,
        elapsed_secs = outcome.stats.elapsed.as_secs_f64(),
        "crawl complete"
    );
    Ok(())
}

async fn extract_words(args: ExtractArgs) -> Result<()> {
    let dump = tokio::fs::read_to_string(&args.dictionary)
        .await
        .with_context(|| format!("couldn't read dictionary {}", args.dictionary.display()))?;

    let words = extract_headwords(&dump, args.limit);
    info!(words = words.len(), "extracted headwords");
    if words.is_empty() {
        return Err(Error::EmptyWordList(args.dictionary).into());
    }

    for format in [WordListFormat::Json, WordListFormat::Text] {
        let path = args.output.with_extension(format.extension());
        save_word_list(&path, &words, format).await?;
    }
    Ok(())
}
