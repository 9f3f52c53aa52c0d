//! Chunked, multi-threaded scoring of a JSONL stream.
//!
//! Three stages share one pipeline: scoring text, embedding text for a
//! later run, and scoring embeddings saved by such a run.
//!
//! ```text
//!  reader ──chunks──▶ [bounded] ──▶ worker × N ──records──▶ [bounded] ──▶ writer
//! ```
//!
//! The calling thread reads and enqueues chunks; workers share one
//! [`ScoringEngine`] by reference; a single writer thread serializes
//! records in completion order. Both queues are bounded, so a slow writer
//! or slow workers block the reader.

use crate::reader::{input_files, RecordReader};
use crate::writer::RecordWriter;
use crate::{BatchConfig, BatchError, Result};
use crossbeam_channel::{bounded, Sender};
use fieldscore_similarity::{Assets, Document, EmbeddedDocument, Embedder, EngineConfig, ScoringEngine};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What a run reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Documents in, score records out.
    #[default]
    Score,
    /// Documents in, embeddings out.
    Embed,
    /// Saved embeddings in, score records out.
    ScoreEmbedded,
}

impl Stage {
    fn verb(self) -> &'static str {
        match self {
            Stage::Score | Stage::ScoreEmbedded => "scored",
            Stage::Embed => "embedded",
        }
    }

    fn thread_prefix(self) -> &'static str {
        match self {
            Stage::Score | Stage::ScoreEmbedded => "score",
            Stage::Embed => "embed",
        }
    }
}

/// Totals of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub stage: Stage,
    /// Valid records taken from the input.
    pub read: u64,
    /// Records written to the output.
    pub scored: u64,
    /// Lines skipped as malformed.
    pub malformed: u64,
    /// Records with nothing to score: blank text, or an embedding with no
    /// signal. They are written all the same.
    pub empty: u64,
    pub chunks: u64,
    pub elapsed: Duration,
    /// The run ended early on a stop request.
    pub stopped: bool,
}

impl RunSummary {
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.scored as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} of {} records ({} empty, {} malformed skipped) in {} chunks, {:.2}s ({:.0} records/s)",
            self.stage.verb(),
            self.scored,
            self.read,
            self.empty,
            self.malformed,
            self.chunks,
            self.elapsed.as_secs_f64(),
            self.records_per_sec()
        )?;
        if self.stopped {
            write!(f, ", stopped early")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    empty: AtomicU64,
}

pub struct BatchScorer<'a> {
    engine: ScoringEngine<'a>,
    config: BatchConfig,
    stop: Arc<AtomicBool>,
}

impl<'a> BatchScorer<'a> {
    pub fn new(assets: &'a Assets, engine_config: EngineConfig, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: ScoringEngine::new(assets, engine_config)?,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    #[inline]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    #[inline]
    pub fn engine(&self) -> &ScoringEngine<'a> {
        &self.engine
    }

    /// Setting this flag stops the run after the chunks already queued.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Share a stop flag created before the scorer, e.g. by a signal handler.
    #[must_use]
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Score every document under `input` into `output`.
    ///
    /// Returns the summary and the output writer, flushed. Malformed input
    /// lines are skipped; any other error stops the run and is returned
    /// once all threads have wound down.
    pub fn run<W: Write + Send>(&self, input: &Path, output: W) -> Result<(RunSummary, W)> {
        self.pipeline(
            Stage::Score,
            input,
            output,
            |doc: &Document| doc.text.trim().is_empty(),
            |chunk| self.engine.score_batch(chunk),
        )
    }

    /// Embed every document under `input` and write one
    /// [`EmbeddedDocument`] line per document, for [`run_embedded`](Self::run_embedded)
    /// to score later.
    pub fn embed<W: Write + Send>(&self, input: &Path, output: W) -> Result<(RunSummary, W)> {
        let embedder = Embedder::new(self.engine.assets());
        self.pipeline(
            Stage::Embed,
            input,
            output,
            |doc: &Document| doc.text.trim().is_empty(),
            |chunk| {
                let texts: Vec<&str> = chunk.iter().map(|d| d.text.as_str()).collect();
                let embeddings = embedder
                    .embed_all(&texts)
                    .into_iter()
                    .zip(chunk)
                    .map(|(embedding, doc)| EmbeddedDocument::new(doc.merged_id.clone(), embedding))
                    .collect();
                Ok(embeddings)
            },
        )
    }

    /// Score embeddings written by [`embed`](Self::embed) without
    /// embedding again. The same assets must be loaded.
    pub fn run_embedded<W: Write + Send>(
        &self,
        input: &Path,
        output: W,
    ) -> Result<(RunSummary, W)> {
        self.pipeline(
            Stage::ScoreEmbedded,
            input,
            output,
            |doc: &EmbeddedDocument| doc.embedding.is_blank(),
            |chunk| self.engine.score_embedded(chunk),
        )
    }

    fn pipeline<T, R, W, F>(
        &self,
        stage: Stage,
        input: &Path,
        output: W,
        is_empty: fn(&T) -> bool,
        process: F,
    ) -> Result<(RunSummary, W)>
    where
        T: DeserializeOwned + Send,
        R: Serialize + Send,
        W: Write + Send,
        F: Fn(&[T]) -> fieldscore_core::Result<Vec<R>> + Sync,
    {
        let started = Instant::now();
        let mut reader = RecordReader::<T>::new(input_files(input)?);
        let counters = Counters::default();
        let progress = self.progress_bar();
        let prefix = stage.thread_prefix();

        info!(
            stage = ?stage,
            input = %input.display(),
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            queue_depth = self.config.queue_depth,
            limit = ?self.config.limit,
            "Starting batch run"
        );

        let (chunk_tx, chunk_rx) = bounded::<Vec<T>>(self.config.queue_depth);
        let (record_tx, record_rx) = bounded::<Vec<R>>(self.config.queue_depth);

        let (fed, written, output) = thread::scope(|s| -> Result<(Result<u64>, u64, W)> {
            let mut workers = Vec::with_capacity(self.config.workers);
            for id in 0..self.config.workers {
                let chunk_rx = chunk_rx.clone();
                let record_tx = record_tx.clone();
                let counters = &counters;
                let process = &process;
                let handle = thread::Builder::new()
                    .name(format!("{prefix}-worker-{id}"))
                    .spawn_scoped(s, move || -> Result<()> {
                        for chunk in chunk_rx {
                            let started = Instant::now();
                            let empty = chunk.iter().filter(|r| is_empty(*r)).count();
                            let records = match process(chunk.as_slice()) {
                                Ok(records) => records,
                                Err(e) => {
                                    self.stop.store(true, Ordering::Release);
                                    return Err(e.into());
                                }
                            };
                            counters.empty.fetch_add(empty as u64, Ordering::Relaxed);
                            debug!(
                                worker = id,
                                docs = chunk.len(),
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "Processed chunk"
                            );
                            if record_tx.send(records).is_err() {
                                break;
                            }
                        }
                        Ok(())
                    })
                    .map_err(|e| BatchError::Thread(format!("failed to spawn worker: {e}")))?;
                workers.push(handle);
            }
            drop(chunk_rx);
            drop(record_tx);

            let progress = &progress;
            let stop = &self.stop;
            let writer = thread::Builder::new()
                .name(format!("{prefix}-writer"))
                .spawn_scoped(s, move || -> Result<(u64, W)> {
                    let mut writer = RecordWriter::new(output);
                    for records in record_rx {
                        for record in &records {
                            if let Err(e) = writer.write(record) {
                                stop.store(true, Ordering::Release);
                                return Err(e);
                            }
                        }
                        progress.inc(records.len() as u64);
                    }
                    let written = writer.written();
                    Ok((written, writer.into_inner()?))
                })
                .map_err(|e| BatchError::Thread(format!("failed to spawn writer: {e}")))?;

            let fed = self.feed(&mut reader, &chunk_tx);
            drop(chunk_tx);

            let mut first_error = None;
            for handle in workers {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(BatchError::Thread("worker panicked".to_string())));
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(BatchError::Thread("writer panicked".to_string())));
            if let Some(e) = first_error {
                return Err(e);
            }
            let (written, output) = written?;
            Ok((fed, written, output))
        })?;
        let chunks = fed?;
        progress.finish_and_clear();

        let summary = RunSummary {
            stage,
            read: reader.read(),
            scored: written,
            malformed: reader.malformed(),
            empty: counters.empty.load(Ordering::Relaxed),
            chunks,
            elapsed: started.elapsed(),
            stopped: self.stop.load(Ordering::Acquire),
        };
        info!(
            stage = ?stage,
            read = summary.read,
            written = summary.scored,
            malformed = summary.malformed,
            empty = summary.empty,
            chunks = summary.chunks,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            records_per_sec = summary.records_per_sec() as u64,
            "Batch run complete"
        );
        Ok((summary, output))
    }

    /// Read chunks and enqueue them until the input, the limit, or a stop
    /// request ends the run. Returns the number of chunks sent.
    fn feed<T: DeserializeOwned>(
        &self,
        reader: &mut RecordReader<T>,
        chunks: &Sender<Vec<T>>,
    ) -> Result<u64> {
        let mut sent = 0u64;
        let mut taken = 0usize;
        loop {
            if self.stop.load(Ordering::Acquire) {
                warn!(chunks = sent, "Stop requested, finishing queued chunks");
                break;
            }
            let want = match self.config.limit {
                Some(limit) if taken >= limit => {
                    debug!(limit, "Record limit reached");
                    break;
                }
                Some(limit) => self.config.batch_size.min(limit - taken),
                None => self.config.batch_size,
            };

            let chunk = reader.next_chunk(want)?;
            let len = chunk.len();
            if len == 0 {
                break;
            }
            taken += len;
            if chunks.send(chunk).is_err() {
                // every worker has exited; the error surfaces on join
                break;
            }
            sent += 1;
            if len < want {
                break;
            }
        }
        Ok(sent)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        match self.config.limit {
            Some(limit) => {
                let pb = ProgressBar::new(limit as u64);
                if let Ok(style) = ProgressStyle::default_bar().template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({per_sec}) {msg}",
                ) {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} records ({per_sec}) {msg}")
                {
                    pb.set_style(style);
                }
                pb.enable_steady_tick(Duration::from_millis(200));
                pb
            }
        }
    }
}
