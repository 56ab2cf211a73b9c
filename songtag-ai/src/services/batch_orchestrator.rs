//! Batch orchestrator
//!
//! Drives one run: scan the input tree, then for each file in scan order
//! normalize → read existing tags → infer → reconcile → write. Files are
//! processed strictly one at a time. A failure is counted against its file
//! and the run continues; only an operator quit stops it early.

use crate::config::RunConfig;
use crate::error::{ProcessError, RunResult};
use crate::models::{AudioFile, FileOutcome, RunStats};
use crate::services::file_scanner::FileScanner;
use crate::services::filename_normalizer::normalize;
use crate::services::inference_client::InferenceClient;
use crate::services::reconciler::{compute_diff, Decision, Reconciler};
use crate::services::tag_store::{tag_store_for, TagStoreOptions, WriteOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every file was visited
    Completed(RunStats),
    /// The operator quit; counters cover the files finished before that
    Aborted(RunStats),
}

impl RunOutcome {
    pub fn stats(&self) -> &RunStats {
        match self {
            Self::Completed(stats) | Self::Aborted(stats) => stats,
        }
    }
}

/// Result of one file step
enum Step {
    Done(FileOutcome),
    Quit,
}

/// Sequential per-file pipeline
pub struct BatchOrchestrator<R, W> {
    config: RunConfig,
    client: InferenceClient,
    reconciler: Reconciler<R, W>,
    scanner: FileScanner,
    stats: RunStats,
    progress: ProgressBar,
}

impl<R: BufRead, W: Write> BatchOrchestrator<R, W> {
    pub fn new(config: RunConfig, client: InferenceClient, reconciler: Reconciler<R, W>) -> Self {
        Self {
            config,
            client,
            reconciler,
            scanner: FileScanner::new(),
            stats: RunStats::new(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Draw a terminal progress bar while the run is active
    pub fn with_progress_bar(mut self) -> Self {
        self.progress = ProgressBar::new(0);
        self.progress.set_style(
            ProgressStyle::with_template(
                "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Process every supported file under the input folder
    pub async fn run(&mut self) -> RunResult<RunOutcome> {
        self.config.validate()?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        let files = self.scanner.scan(&self.config.input_dir)?;
        self.stats = RunStats::new();
        self.stats.total_files = files.len();

        if files.is_empty() {
            warn!(
                "No audio files found to process in {}",
                self.config.input_dir.display()
            );
            return Ok(RunOutcome::Completed(self.stats.clone()));
        }

        info!(
            total_files = files.len(),
            input = %self.config.input_dir.display(),
            output = %self.config.output_dir.display(),
            "Found {} audio files to process",
            files.len()
        );

        let total = files.len();
        self.progress.set_length(total as u64);
        for (index, file) in files.iter().enumerate() {
            info!("Processing file {}/{}: {}", index + 1, total, file.display_name);
            self.progress.set_message(file.display_name.clone());

            let outcome = match self.process_file(file).await {
                Ok(Step::Done(outcome)) => outcome,
                Ok(Step::Quit) => {
                    self.progress.abandon();
                    return Ok(RunOutcome::Aborted(self.stats.clone()));
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file.path.display(), e);
                    FileOutcome::Error
                }
            };
            self.stats.record(outcome);
            self.progress.inc(1);

            let is_last = index + 1 == total;
            if (index + 1) % self.config.batch_size == 0 || is_last {
                info!("{}", self.stats.progress_string());
            }

            if !is_last && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        self.progress.finish_and_clear();
        Ok(RunOutcome::Completed(self.stats.clone()))
    }

    /// Run the pipeline for one file
    async fn process_file(&mut self, file: &AudioFile) -> Result<Step, ProcessError> {
        let format = file
            .format
            .ok_or_else(|| ProcessError::UnsupportedFormat(file.path.clone()))?;

        let key = normalize(&file.display_name, self.config.normalize_mode);
        debug!(file = %file.display_name, key = %key, "Normalized filename");

        let store = tag_store_for(
            format,
            TagStoreOptions {
                overwrite: self.config.overwrite,
            },
        );
        let existing = store.read_existing(&file.path)?;

        let inferred = self.client.infer(&key, Some(&existing)).await;
        if let Some(message) = &inferred.error {
            return Err(ProcessError::Inference(message.clone()));
        }

        let diff = compute_diff(&existing, &inferred);
        debug!(
            file = %file.display_name,
            changed = diff.changed_count(),
            "Computed metadata diff"
        );

        let reconciler = &mut self.reconciler;
        let decision = self
            .progress
            .suspend(|| reconciler.confirm(&file.display_name, &diff))?;
        match decision {
            Decision::Proceed => {}
            Decision::Skip => {
                info!("Skipped by operator: {}", file.display_name);
                return Ok(Step::Done(FileOutcome::Skipped));
            }
            Decision::Quit => return Ok(Step::Quit),
        }

        let output = file.output_path(&self.config.output_dir);
        match store.write(&file.path, &output, &inferred) {
            WriteOutcome::Written => Ok(Step::Done(FileOutcome::Success)),
            WriteOutcome::Skipped => Ok(Step::Done(FileOutcome::Skipped)),
            WriteOutcome::Failed(reason) => Err(ProcessError::Write(reason)),
        }
    }
}
