//! Discovered audio files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tag container family, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG audio with an ID3v2 tag
    Mp3,
    /// Ogg Opus with a Vorbis comment block
    Opus,
}

impl AudioFormat {
    /// Map a file extension (any case) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "opus" => Some(Self::Opus),
            _ => None,
        }
    }

    /// Map a path to a format using its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp3 => write!(f, "MP3"),
            Self::Opus => write!(f, "Opus"),
        }
    }
}

/// An audio file found during discovery
///
/// Immutable once created; lives for one pass of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    /// Absolute path of the source file
    pub path: PathBuf,
    /// Container format, `None` when the extension is not supported
    pub format: Option<AudioFormat>,
    /// File name shown in logs and prompts
    pub display_name: String,
}

impl AudioFile {
    /// Build a record for `path`, making it absolute when possible
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let format = AudioFormat::from_path(&path);

        Self {
            path,
            format,
            display_name,
        }
    }

    /// Flat destination inside `output_dir` (subdirectories are not mirrored)
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_extension("opus"), Some(AudioFormat::Opus));
        assert_eq!(AudioFormat::from_extension("flac"), None);
    }

    #[test]
    fn test_audio_file_fields() {
        let file = AudioFile::new("/music/album/01 Song.mp3");
        assert_eq!(file.display_name, "01 Song.mp3");
        assert_eq!(file.format, Some(AudioFormat::Mp3));
        assert!(file.path.is_absolute());
    }

    #[test]
    fn test_output_path_is_flat() {
        let file = AudioFile::new("/music/a/b/track.opus");
        assert_eq!(
            file.output_path(Path::new("/out")),
            PathBuf::from("/out/track.opus")
        );
    }

    #[test]
    fn test_unsupported_extension_has_no_format() {
        let file = AudioFile::new("/music/track.wav");
        assert_eq!(file.format, None);
    }
}
