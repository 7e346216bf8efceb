//! Drives lookups for a word list and accumulates the dataset.
//!
//! Words are split into batches, batches into chunks of `concurrent_limit` words. Every lookup
//! in a chunk is spawned at once and the whole chunk is awaited before the next one starts.
//! Records are extracted and merged only after the chunk settles, one at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::model::{RawLookupResponse, ResultSet};
use crate::parse::extract_record;
use crate::request::LookupClient;
use crate::retry::{retry, Attempted, RetryPolicy, DEFAULT_RETRY_DELAY, DEFAULT_RETRY_LIMIT};
use crate::store::{ErrorLog, ResultStore};
use crate::words::pending_words;
use crate::{info_time, Error, Result};

/// Run at full speed for `active`, then stay idle for `pause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycle {
    pub active: Duration,
    pub pause: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Lookups in flight at once; also the chunk size.
    pub concurrent_limit: usize,
    /// Words per batch. Results are saved after every batch.
    pub batch_size: usize,
    pub duty_cycle: Option<DutyCycle>,
    /// Save after this many new records since the last save.
    pub save_interval: usize,
    /// Attempts per word, the first one included.
    pub retry_limit: u32,
    pub retry_delay: Duration,
    /// Wait after every chunk. Used by the one-word-at-a-time setup.
    pub word_delay: Duration,
    /// Wait between two batches.
    pub batch_pause: Duration,
    /// Limit on a single lookup attempt; an attempt that runs over counts as a transient
    /// failure. `None` leaves it to the client, so a stuck lookup holds up its chunk.
    pub request_timeout: Option<Duration>,
}

impl CrawlConfig {
    /// Many lookups at once with an on/off throttle.
    pub fn concurrent() -> Self {
        Self {
            concurrent_limit: 50,
            batch_size: 500,
            duty_cycle: Some(DutyCycle {
                active: Duration::from_secs(10),
                pause: Duration::from_secs(5),
            }),
            save_interval: 200,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_delay: DEFAULT_RETRY_DELAY,
            word_delay: Duration::ZERO,
            batch_pause: Duration::ZERO,
            request_timeout: None,
        }
    }

    /// One word at a time, a second apart, in small batches with a long pause between them.
    pub fn sequential() -> Self {
        Self {
            concurrent_limit: 1,
            batch_size: 5,
            duty_cycle: None,
            save_interval: 5,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_delay: DEFAULT_RETRY_DELAY,
            word_delay: Duration::from_secs(1),
            batch_pause: Duration::from_secs(10),
            request_timeout: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("concurrent_limit", self.concurrent_limit == 0),
            ("batch_size", self.batch_size == 0),
            ("save_interval", self.save_interval == 0),
            ("retry_limit", self.retry_limit == 0),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, self.retry_delay)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::concurrent()
    }
}

/// Counters for one run. `processed` and `failed` only count words looked up in this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub processed: usize,
    pub failed: usize,
    /// Words that needed more than one attempt, whatever their outcome.
    pub retried: usize,
    /// Words skipped because the existing data already had them.
    pub skipped: usize,
    pub elapsed: Duration,
}

impl CrawlStats {
    pub fn words_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Totals over a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub words: usize,
    pub basic_meanings: usize,
    pub phrases: usize,
    pub terms: usize,
    pub examples: usize,
}

impl DatasetSummary {
    pub fn of(results: &ResultSet) -> Self {
        results.values().fold(
            DatasetSummary {
                words: results.len(),
                ..Default::default()
            },
            |mut acc, record| {
                acc.basic_meanings += record.definition.basic_meanings.len();
                acc.phrases += record.definition.phrases.len();
                acc.terms += record.terms.economic.len() + record.terms.technical.len();
                acc.examples += record.examples.len();
                acc
            },
        )
    }
}

#[derive(Debug)]
pub struct CrawlOutcome {
    /// Existing data plus every record fetched in this run.
    pub results: ResultSet,
    pub stats: CrawlStats,
}

pub struct Crawler {
    client: Arc<dyn LookupClient>,
    config: CrawlConfig,
    store: Option<ResultStore>,
    error_log: Option<ErrorLog>,
}

impl Crawler {
    pub fn new(client: Arc<dyn LookupClient>, config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            store: None,
            error_log: None,
        })
    }

    /// Checkpoints go to `store`. Without one the run keeps everything in memory.
    pub fn with_store(mut self, store: ResultStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_error_log(mut self, error_log: ErrorLog) -> Self {
        self.error_log = Some(error_log);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Looks up every word missing from `existing` and returns the union.
    ///
    /// A word that still fails after `retry_limit` attempts is logged and left out; it never
    /// stops the run. Save failures are logged too, the in-memory results stay authoritative.
    pub async fn run(&self, words: &[String], existing: ResultSet) -> CrawlOutcome {
        let start_time = Local::now();
        let started = Instant::now();
        let pending = pending_words(words, &existing);
        let mut stats = CrawlStats {
            skipped: words
                .iter()
                .filter(|word| existing.contains_key(word.as_str()))
                .count(),
            ..Default::default()
        };
        let mut results = existing;

        info_time!(
            "Started crawling {} words ({} already done), {} at a time",
            pending.len(),
            stats.skipped,
            self.config.concurrent_limit
        );

        let batch_count = pending.len().div_ceil(self.config.batch_size);
        let mut since_checkpoint = 0;
        let mut active_since = Instant::now();

        for (batch_idx, batch) in pending.chunks(self.config.batch_size).enumerate() {
            let batch_start = Local::now();
            info!(
                batch = batch_idx + 1,
                of = batch_count,
                words = batch.len(),
                "processing batch"
            );

            let chunk_count = batch.len().div_ceil(self.config.concurrent_limit);
            for (chunk_idx, chunk) in batch.chunks(self.config.concurrent_limit).enumerate() {
                let report = self.process_chunk(chunk, &mut results, &mut stats).await;
                since_checkpoint += report.succeeded;

                if report.task_failed || since_checkpoint >= self.config.save_interval {
                    stats.elapsed = started.elapsed();
                    self.checkpoint(&results, &stats).await;
                    since_checkpoint = 0;
                }

                let last_chunk = batch_idx + 1 == batch_count && chunk_idx + 1 == chunk_count;
                if let Some(duty) = self.config.duty_cycle.filter(|_| !last_chunk) {
                    if active_since.elapsed() >= duty.active {
                        info!(
                            active_secs = duty.active.as_secs_f64(),
                            pause_secs = duty.pause.as_secs_f64(),
                            "active period over, pausing"
                        );
                        tokio::time::sleep(duty.pause).await;
                        active_since = Instant::now();
                    }
                }

                if !self.config.word_delay.is_zero() && !last_chunk {
                    tokio::time::sleep(self.config.word_delay).await;
                }
            }

            stats.elapsed = started.elapsed();
            self.checkpoint(&results, &stats).await;
            since_checkpoint = 0;
            info_time!(
                batch_start,
                "Finished batch {}/{}, {} words saved",
                batch_idx + 1,
                batch_count,
                results.len()
            );

            if !self.config.batch_pause.is_zero() && batch_idx + 1 < batch_count {
                info!(
                    pause_secs = self.config.batch_pause.as_secs_f64(),
                    "pausing before next batch"
                );
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        stats.elapsed = started.elapsed();
        info_time!(
            start_time,
            "Finished crawling: {} new, {} failed, {:.2} words/sec",
            stats.processed,
            stats.failed,
            stats.words_per_second()
        );
        let summary = DatasetSummary::of(&results);
        info!(
            words = summary.words,
            basic_meanings = summary.basic_meanings,
            phrases = summary.phrases,
            terms = summary.terms,
            examples = summary.examples,
            "dataset summary"
        );

        CrawlOutcome { results, stats }
    }

    /// Fetches every word of `chunk` concurrently, waits for all of them, then merges.
    async fn process_chunk(
        &self,
        chunk: &[String],
        results: &mut ResultSet,
        stats: &mut CrawlStats,
    ) -> ChunkReport {
        let policy = self.config.retry_policy();
        let timeout = self.config.request_timeout;
        let mut task_set = JoinSet::new();
        for (idx, word) in chunk.iter().enumerate() {
            task_set.spawn({
                // Arc, so cloning per task is cheap
                let client = Arc::clone(&self.client);
                let policy = policy.clone();
                let word = word.clone();

                async move { (idx, fetch_word(client.as_ref(), &policy, timeout, &word).await) }
            });
        }

        let mut fetched: Vec<Option<Attempted<RawLookupResponse>>> =
            (0..chunk.len()).map(|_| None).collect();
        let mut report = ChunkReport::default();
        while let Some(task) = task_set.join_next().await {
            match task {
                Ok((idx, attempted)) => fetched[idx] = Some(attempted),
                Err(err) => {
                    error!(error = %Error::RuntimeJoin(err), "lookup task failed");
                    report.task_failed = true;
                }
            }
        }

        for (word, attempted) in chunk.iter().zip(fetched) {
            let Some(Attempted { result, attempts }) = attempted else {
                stats.failed += 1;
                self.log_failure(word, "lookup task did not finish").await;
                continue;
            };
            if attempts > 1 {
                stats.retried += 1;
            }
            match result {
                Ok(response) => {
                    results.insert(word.clone(), extract_record(&response, word));
                    stats.processed += 1;
                    report.succeeded += 1;
                    info!("✓ {word}");
                }
                Err(err) => {
                    stats.failed += 1;
                    error!(word = %word, attempts, error = %err, "✗ lookup failed");
                    self.log_failure(word, &err.to_string()).await;
                }
            }
        }
        report
    }

    async fn checkpoint(&self, results: &ResultSet, stats: &CrawlStats) {
        let Some(store) = &self.store else {
            return;
        };
        match store.save(results).await {
            Ok(()) => info!(
                words = results.len(),
                new = stats.processed,
                words_per_sec = stats.words_per_second(),
                path = %store.path().display(),
                "checkpoint saved"
            ),
            Err(err) => error!(
                path = %store.path().display(),
                error = %err,
                "checkpoint failed, keeping results in memory"
            ),
        }
    }

    async fn log_failure(&self, word: &str, message: &str) {
        let Some(log) = &self.error_log else {
            return;
        };
        if let Err(err) = log.append(word, message).await {
            warn!(word, path = %log.path().display(), error = %err, "couldn't write error log");
        }
    }
}

#[derive(Debug, Default)]
struct ChunkReport {
    succeeded: usize,
    /// A spawned lookup died without reporting back.
    task_failed: bool,
}

async fn fetch_word(
    client: &dyn LookupClient,
    policy: &RetryPolicy,
    timeout: Option<Duration>,
    word: &str,
) -> Attempted<RawLookupResponse> {
    retry(policy, move |attempt| async move {
        if attempt > 1 {
            debug!(word, attempt, "retrying lookup");
        }
        let Some(after) = timeout else {
            return client.fetch(word).await;
        };
        tokio::time::timeout(after, client.fetch(word))
            .await
            .map_err(|_| Error::Timeout {
                word: word.to_string(),
                after,
            })?
    })
    .await
}
