//! Filename normalisation
//!
//! Turns a raw filename such as `03 - [Live] Song_Name.mp3` into the query
//! key sent to the inference backend (`Song Name`). Pure and infallible; a
//! degenerate filename yields an empty key.

use crate::models::QueryKey;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Leading track number followed by separators
static TRACK_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[\s_\-.]+").expect("valid regex"));

/// Leading bracketed tag such as `[Live]`, with trailing separators
static BRACKET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]*\][\s_\-.]*").expect("valid regex"));

static ALL_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-.]+").expect("valid regex"));

static NON_DASH_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_.]+").expect("valid regex"));

static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-+\s*").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// How separator characters are folded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// `_`, `-` and `.` all become spaces
    #[default]
    Collapse,
    /// `_` and `.` become spaces; dashes survive as `" - "` so an
    /// "Artist - Title" filename keeps its structure
    KeepDash,
}

/// Derive the query key for `filename`
pub fn normalize(filename: &str, mode: NormalizeMode) -> QueryKey {
    let name = strip_extension(filename);

    let name = match mode {
        NormalizeMode::Collapse => ALL_SEPARATORS.replace_all(name, " ").into_owned(),
        NormalizeMode::KeepDash => {
            let spaced = NON_DASH_SEPARATORS.replace_all(name, " ");
            DASH_RUN.replace_all(&spaced, " - ").into_owned()
        }
    };
    let mut name = WHITESPACE.replace_all(&name, " ").into_owned();

    // Prefixes may be stacked ("[Live] 03 - Song"); strip until stable
    loop {
        let trimmed = name.trim_start_matches(is_edge_noise);
        let stripped = TRACK_NUMBER_PREFIX.replace(trimmed, "");
        let stripped = BRACKET_PREFIX.replace(&stripped, "").into_owned();
        if stripped == name {
            break;
        }
        name = stripped;
    }

    QueryKey::new(name.trim_end_matches(is_edge_noise))
}

/// Whitespace, or a dash with nothing to join at the start or end of a key
fn is_edge_noise(c: char) -> bool {
    c == '-' || c.is_whitespace()
}

/// Drop the final `.ext` of the last path component, if any
fn strip_extension(filename: &str) -> &str {
    let path = Path::new(filename);
    match (path.extension(), path.file_stem().and_then(|s| s.to_str())) {
        (Some(_), Some(stem)) => stem,
        _ => path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename),
    }
}
