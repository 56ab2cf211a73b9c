//! Run statistics
//!
//! One `RunStats` per invocation. Every processed file increments
//! `processed_files` and exactly one of `success`, `skipped`, `errors`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Terminal state of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
    Success,
    Skipped,
    Error,
}

/// Counters accumulated over one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_files: usize,
    pub processed_files: usize,
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            total_files: 0,
            processed_files: 0,
            success: 0,
            errors: 0,
            skipped: 0,
            started_at: Utc::now(),
        }
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terminal state of one file
    pub fn record(&mut self, outcome: FileOutcome) {
        self.processed_files += 1;
        match outcome {
            FileOutcome::Success => self.success += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Error => self.errors += 1,
        }
    }

    pub fn progress_string(&self) -> String {
        format!(
            "Progress: {}/{} files processed.",
            self.processed_files, self.total_files
        )
    }

    /// Write the run summary block to the log
    pub fn log_summary(&self) {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        let rule = "=".repeat(50);

        info!("{}", rule);
        info!("PROCESSING SUMMARY");
        info!("{}", rule);
        info!("Total files found: {}", self.total_files);
        info!("Files processed: {}", self.processed_files);
        info!("Successful updates: {}", self.success);
        info!("Skipped files: {}", self.skipped);
        info!("Errors: {}", self.errors);
        info!("Elapsed: {}s", elapsed.num_seconds());
        info!("{}", rule);
    }
}
