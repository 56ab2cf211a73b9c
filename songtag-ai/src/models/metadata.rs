//! Metadata records exchanged between pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cleaned filename used as the subject of an inference request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed field set shared by existing and inferred metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Title,
    Artist,
    Album,
    Year,
    Composer,
    Genre,
    Language,
}

impl MetadataField {
    /// Display order used by diffs and prompts
    pub const ALL: [MetadataField; 7] = [
        MetadataField::Title,
        MetadataField::Artist,
        MetadataField::Album,
        MetadataField::Year,
        MetadataField::Composer,
        MetadataField::Genre,
        MetadataField::Language,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Artist => "Artist",
            Self::Album => "Album",
            Self::Year => "Year",
            Self::Composer => "Composer",
            Self::Genre => "Genre",
            Self::Language => "Language",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata already present in a file's tag container
///
/// Read fresh from the source file before any write; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    /// Free-text comments, informational only
    pub comments: Vec<String>,
}

impl ExistingMetadata {
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        let value = match field {
            MetadataField::Title => &self.title,
            MetadataField::Artist => &self.artist,
            MetadataField::Album => &self.album,
            MetadataField::Year => &self.year,
            MetadataField::Composer => &self.composer,
            MetadataField::Genre => &self.genre,
            MetadataField::Language => &self.language,
        };
        value.as_deref()
    }

    /// Non-empty fields, in display order
    pub fn hints(&self) -> Vec<(MetadataField, &str)> {
        MetadataField::ALL
            .iter()
            .filter_map(|&field| {
                self.get(field)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (field, v))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hints().is_empty() && self.comments.is_empty()
    }
}

/// Metadata returned by the inference backend, already coerced to strings
///
/// Every field is optional. `error` is set when inference failed, in which
/// case `title` carries the query key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredMetadata {
    pub title: Option<String>,
    /// Performers joined into a single `", "`-delimited string
    pub artists: Option<String>,
    pub album: Option<String>,
    /// Release year as reported; may be non-numeric
    pub year: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub error: Option<String>,
}

impl InferredMetadata {
    /// Fallback record for a failed inference
    pub fn fallback(query_key: &QueryKey, message: impl Into<String>) -> Self {
        Self {
            title: Some(query_key.as_str().to_string()),
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        let value = match field {
            MetadataField::Title => &self.title,
            MetadataField::Artist => &self.artists,
            MetadataField::Album => &self.album,
            MetadataField::Year => &self.year,
            MetadataField::Composer => &self.composer,
            MetadataField::Genre => &self.genre,
            MetadataField::Language => &self.language,
        };
        value.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
