//! Error types for songtag-ai
//!
//! `ProcessError` covers failures of a single file; the orchestrator counts
//! them and moves on. `RunError` aborts the run before any file is touched.

use crate::services::file_scanner::ScanError;
use crate::services::reconciler::ReconcileError;
use crate::services::tag_store::TagError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while processing one file
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Extension outside the supported set
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Backend unreachable or response unusable
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Existing tags could not be read
    #[error(transparent)]
    Tag(#[from] TagError),

    /// Tag write failed; the partial output has been removed
    #[error("Write failed: {0}")]
    Write(String),

    /// Confirmation prompt failed
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Failure that stops the run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] songtag_common::Error),
}

/// Convenience result alias for run-level operations
pub type RunResult<T> = Result<T, RunError>;
