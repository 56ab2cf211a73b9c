//! Ogg Opus / Vorbis comment tag store
//!
//! Every Opus stream carries a Vorbis comment header, so "no container"
//! means an empty comment block. Language is a native `LANGUAGE` field here.

use super::{
    copy_to_output, discard_output, has_text, validated_year, TagError, TagStore, TagStoreOptions,
    WriteOutcome,
};
use crate::models::{AudioFormat, ExistingMetadata, InferredMetadata};
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::ogg::{OpusFile, VorbisComments};
use lofty::tag::TagExt;
use std::fs::File;
use std::path::Path;
use tracing::{debug, error, info};

const TITLE: &str = "TITLE";
const ARTIST: &str = "ARTIST";
const ALBUM: &str = "ALBUM";
const DATE: &str = "DATE";
const COMPOSER: &str = "COMPOSER";
const GENRE: &str = "GENRE";
const LANGUAGE: &str = "LANGUAGE";
const COMMENT: &str = "COMMENT";

/// Vorbis comment tag store for Ogg Opus files
pub struct OpusTagStore {
    options: TagStoreOptions,
}

impl OpusTagStore {
    pub fn new(options: TagStoreOptions) -> Self {
        Self { options }
    }

    fn load(path: &Path) -> Result<OpusFile, TagError> {
        let mut file = File::open(path)?;
        Ok(OpusFile::read_from(&mut file, ParseOptions::new())?)
    }

    fn try_write(
        &self,
        source: &Path,
        output: &Path,
        metadata: &InferredMetadata,
    ) -> Result<WriteOutcome, TagError> {
        copy_to_output(source, output)?;

        let mut opus = Self::load(output)?;
        let comments = opus.vorbis_comments_mut();

        if comments.is_empty() {
            debug!("Empty Vorbis comment block in {}", output.display());
        } else if !self.options.overwrite
            && (has_text(comments.get(TITLE)) || has_text(comments.get(ARTIST)))
        {
            info!(
                "Skipping '{}' - already has metadata and overwrite is disabled",
                output.display()
            );
            return Ok(WriteOutcome::Skipped);
        }

        apply_fields(comments, metadata);

        opus.save_to_path(output, WriteOptions::default())?;
        Ok(WriteOutcome::Written)
    }
}

impl TagStore for OpusTagStore {
    fn format(&self) -> AudioFormat {
        AudioFormat::Opus
    }

    fn read_existing(&self, path: &Path) -> Result<ExistingMetadata, TagError> {
        let opus = Self::load(path)?;
        Ok(existing_from_comments(opus.vorbis_comments()))
    }

    fn write(&self, source: &Path, output: &Path, metadata: &InferredMetadata) -> WriteOutcome {
        match self.try_write(source, output, metadata) {
            Ok(outcome) => {
                if outcome.is_written() {
                    info!(
                        "Successfully updated metadata for '{}' saved to {}",
                        source.display(),
                        output.display()
                    );
                }
                outcome
            }
            Err(e) => {
                error!("Error updating metadata for '{}': {}", source.display(), e);
                if !matches!(e, TagError::SameFile(_)) {
                    discard_output(output);
                }
                WriteOutcome::Failed(e.to_string())
            }
        }
    }
}

fn existing_from_comments(comments: &VorbisComments) -> ExistingMetadata {
    let get = |key: &str| comments.get(key).map(str::to_string);

    ExistingMetadata {
        title: get(TITLE),
        artist: get(ARTIST),
        album: get(ALBUM),
        year: get(DATE),
        composer: get(COMPOSER),
        genre: get(GENRE),
        language: get(LANGUAGE),
        comments: comments.get_all(COMMENT).map(str::to_string).collect(),
    }
}

/// Apply every present field of `metadata` to `comments`
fn apply_fields(comments: &mut VorbisComments, metadata: &InferredMetadata) {
    let mut set = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            comments.insert(key.to_string(), value.clone());
        }
    };

    set(TITLE, &metadata.title);
    set(ARTIST, &metadata.artists);
    set(ALBUM, &metadata.album);
    set(COMPOSER, &metadata.composer);
    set(GENRE, &metadata.genre);
    set(LANGUAGE, &metadata.language);

    if let Some(year) = metadata.year.as_deref().and_then(validated_year) {
        comments.insert(DATE.to_string(), year.to_string());
    }
}
