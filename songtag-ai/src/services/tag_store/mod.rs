//! Tag store adapters
//!
//! One interface over the two supported containers:
//! - MP3: ID3v2 via the `id3` crate (`Id3TagStore`)
//! - Ogg Opus: Vorbis comments via `lofty` (`OpusTagStore`)
//!
//! `write` never mutates the source: the file is copied to the output path
//! first and every change is applied to the copy. Errors never escape
//! `write`; they surface as `WriteOutcome::Failed`.

mod id3_store;
mod opus_store;

pub use id3_store::Id3TagStore;
pub use opus_store::OpusTagStore;

use crate::models::{AudioFormat, ExistingMetadata, InferredMetadata, MetadataField};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Tag store errors
#[derive(Debug, Error)]
pub enum TagError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID3 error: {0}")]
    Id3(#[from] id3::Error),

    #[error("Ogg/Vorbis error: {0}")]
    Lofty(#[from] lofty::error::LoftyError),

    /// The container refused a field value
    #[error("{field} rejected: {reason}")]
    Rejected { field: MetadataField, reason: String },

    /// Source and destination resolve to the same file
    #[error("Refusing to write over the source file: {0}")]
    SameFile(PathBuf),
}

/// Result of a write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Tags were saved to the output file
    Written,
    /// Existing metadata was kept because overwrite is disabled
    Skipped,
    /// Load, apply or save failed
    Failed(String),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Write behaviour shared by both containers
#[derive(Debug, Clone, Copy)]
pub struct TagStoreOptions {
    /// Replace a title/artist that is already present
    pub overwrite: bool,
}

impl Default for TagStoreOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Read/write access to one container format
pub trait TagStore: Send + Sync {
    fn format(&self) -> AudioFormat;

    /// Read the metadata currently stored in `path`
    ///
    /// A file without a tag container yields an empty record.
    fn read_existing(&self, path: &Path) -> Result<ExistingMetadata, TagError>;

    /// Copy `source` to `output` and apply `metadata` to the copy
    fn write(&self, source: &Path, output: &Path, metadata: &InferredMetadata) -> WriteOutcome;
}

/// Select the store for `format`
pub fn tag_store_for(format: AudioFormat, options: TagStoreOptions) -> Box<dyn TagStore> {
    match format {
        AudioFormat::Mp3 => Box::new(Id3TagStore::new(options)),
        AudioFormat::Opus => Box::new(OpusTagStore::new(options)),
    }
}

/// Duplicate `source` to `output`, refusing to copy a file onto itself
fn copy_to_output(source: &Path, output: &Path) -> Result<(), TagError> {
    if let (Ok(src), Ok(dst)) = (source.canonicalize(), output.canonicalize()) {
        if src == dst {
            return Err(TagError::SameFile(dst));
        }
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("Copying file to output folder: {}", output.display());
    std::fs::copy(source, output)?;
    Ok(())
}

/// Remove an output copy left behind by a failed write
fn discard_output(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            warn!("Could not remove partial output {}: {}", output.display(), e);
        }
    }
}

/// Accept a year only when it is made of ASCII digits
fn validated_year(value: &str) -> Option<&str> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Some(value)
    } else {
        warn!("Invalid year value '{}', skipping", value);
        None
    }
}

/// True when `value` holds any non-whitespace text
fn has_text(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}
