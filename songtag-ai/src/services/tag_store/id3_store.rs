//! MP3 / ID3v2 tag store
//!
//! New tags are created as ID3v2.3. ID3 has no language field in common use,
//! so language is stored as a comment `Language: <value>`. A genre the ID3
//! rules reject is stored as a comment `Genre: <value>` instead.

use super::{
    copy_to_output, discard_output, has_text, validated_year, TagError, TagStore, TagStoreOptions,
    WriteOutcome,
};
use crate::models::{AudioFormat, ExistingMetadata, InferredMetadata, MetadataField};
use id3::frame::Comment;
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;
use tracing::{debug, error, info, warn};

const COMPOSER_FRAME: &str = "TCOM";
const LANGUAGE_FRAME: &str = "TLAN";
const COMMENT_LANG: &str = "eng";
const LANGUAGE_PREFIX: &str = "Language: ";
const GENRE_PREFIX: &str = "Genre: ";

/// Highest genre index in the (Winamp-extended) ID3v1 table
const MAX_GENRE_ID: u32 = 191;

/// ID3v2 tag store for MP3 files
pub struct Id3TagStore {
    options: TagStoreOptions,
}

impl Id3TagStore {
    pub fn new(options: TagStoreOptions) -> Self {
        Self { options }
    }

    /// Load the tag at `path`, `None` when the file carries no ID3 tag
    fn load(path: &Path) -> Result<Option<Tag>, TagError> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(Some(tag)),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn try_write(
        &self,
        source: &Path,
        output: &Path,
        metadata: &InferredMetadata,
    ) -> Result<WriteOutcome, TagError> {
        copy_to_output(source, output)?;

        let mut tag = match Self::load(output)? {
            Some(tag) => {
                if !self.options.overwrite && (has_text(tag.title()) || has_text(tag.artist())) {
                    info!(
                        "Skipping '{}' - already has metadata and overwrite is disabled",
                        output.display()
                    );
                    return Ok(WriteOutcome::Skipped);
                }
                tag
            }
            None => {
                debug!("No ID3 tag in {}, creating ID3v2.3", output.display());
                Tag::with_version(Version::Id3v23)
            }
        };

        apply_fields(&mut tag, metadata);

        tag.write_to_path(output, Version::Id3v23)?;
        Ok(WriteOutcome::Written)
    }
}

impl TagStore for Id3TagStore {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn read_existing(&self, path: &Path) -> Result<ExistingMetadata, TagError> {
        let tag = match Self::load(path)? {
            Some(tag) => tag,
            None => return Ok(ExistingMetadata::default()),
        };

        let comments: Vec<String> = tag.comments().map(|c| c.text.clone()).collect();
        let language = text_frame(&tag, LANGUAGE_FRAME).or_else(|| {
            comments
                .iter()
                .find_map(|c| c.strip_prefix(LANGUAGE_PREFIX))
                .map(|l| l.trim().to_string())
        });
        let year = tag
            .year()
            .or_else(|| tag.date_recorded().map(|ts| ts.year))
            .map(|y| y.to_string());

        Ok(ExistingMetadata {
            title: tag.title().map(str::to_string),
            artist: tag.artist().map(str::to_string),
            album: tag.album().map(str::to_string),
            year,
            composer: text_frame(&tag, COMPOSER_FRAME),
            genre: tag.genre().map(str::to_string),
            language,
            comments,
        })
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

fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    tag.get(id)
        .and_then(|frame| frame.content().text())
        .map(str::to_string)
}

/// Replace (or add) the comment identified by `description`
fn set_comment(tag: &mut Tag, description: &str, text: String) {
    tag.remove_comment(Some(description), None);
    tag.add_frame(Comment {
        lang: COMMENT_LANG.to_string(),
        description: description.to_string(),
        text,
    });
}

/// Check a genre against the ID3 genre rules
///
/// Numeric references (`17`, `(17)`) must name an ID3v1 genre and text must
/// not contain NUL, which ID3 uses as a list separator.
fn validate_genre(genre: &str) -> Result<(), TagError> {
    let reject = |reason: String| TagError::Rejected {
        field: MetadataField::Genre,
        reason,
    };

    if genre.contains('\0') {
        return Err(reject("embedded NUL".to_string()));
    }

    let reference = genre
        .strip_prefix('(')
        .and_then(|g| g.strip_suffix(')'))
        .unwrap_or(genre);
    if !reference.is_empty() && reference.bytes().all(|b| b.is_ascii_digit()) {
        match reference.parse::<u32>() {
            Ok(id) if id <= MAX_GENRE_ID => {}
            _ => return Err(reject(format!("unknown genre id {}", reference))),
        }
    }

    Ok(())
}

/// Apply every present field of `metadata` to `tag`
fn apply_fields(tag: &mut Tag, metadata: &InferredMetadata) {
    if let Some(title) = &metadata.title {
        tag.set_title(title.as_str());
    }

    if let Some(artists) = &metadata.artists {
        tag.set_artist(artists.as_str());
    }

    if let Some(album) = &metadata.album {
        tag.set_album(album.as_str());
    }

    if let Some(year) = metadata.year.as_deref().and_then(validated_year) {
        match year.parse::<i32>() {
            Ok(year) => tag.set_year(year),
            Err(e) => warn!("Invalid year value '{}': {}", year, e),
        }
    }

    if let Some(composer) = &metadata.composer {
        tag.set_text(COMPOSER_FRAME, composer.as_str());
    }

    if let Some(language) = &metadata.language {
        set_comment(tag, "Language", format!("{}{}", LANGUAGE_PREFIX, language));
    }

    if let Some(genre) = &metadata.genre {
        match validate_genre(genre) {
            Ok(()) => tag.set_genre(genre.as_str()),
            Err(e) => {
                warn!("Error setting genre '{}': {}", genre, e);
                set_comment(tag, "Genre", format!("{}{}", GENRE_PREFIX, genre));
            }
        }
    }
}
