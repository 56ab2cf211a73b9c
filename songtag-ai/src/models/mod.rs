//! Data models for songtag-ai
//!
//! - Discovered audio files and their container format
//! - Existing (read from file) and inferred (from the backend) metadata
//! - Per-run statistics

pub mod audio_file;
pub mod metadata;
pub mod run_stats;

pub use audio_file::{AudioFile, AudioFormat};
pub use metadata::{ExistingMetadata, InferredMetadata, MetadataField, QueryKey};
pub use run_stats::{FileOutcome, RunStats};
