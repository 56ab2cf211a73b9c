//! Metadata inference client
//!
//! Asks the configured backend for song metadata and coerces whatever comes
//! back into an `InferredMetadata` record. Never fails: transport errors and
//! unparseable responses become a fallback record whose title is the query
//! key and whose `error` is set.

use crate::models::{ExistingMetadata, InferredMetadata, QueryKey};
use crate::services::transport::{InferenceRequest, InferenceTransport};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, warn};

const SYSTEM_PROMPT: &str = "You are a music metadata expert with comprehensive knowledge of music \
across all genres, artists, and time periods. Provide accurate metadata in JSON format ONLY. \
Do not include any explanations or comments outside the JSON object.";

const RESPONSE_EXAMPLES: &str = r#"Example response format:

Example 1 (English song):
{
  "title": "Yesterday",
  "artists": "The Beatles",
  "album": "Help!",
  "year": 1965,
  "composer": "John Lennon, Paul McCartney",
  "genre": "Rock",
  "language": "English"
}

Example 2 (Hindi song):
{
  "title": "Tum Hi Ho",
  "artists": "Arijit Singh",
  "album": "Aashiqui 2",
  "year": 2013,
  "composer": "Mithoon",
  "genre": "Indian Pop",
  "language": "Hindi"
}"#;

/// Options shaping the request
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Model identifier passed to the transport
    pub model: String,
    /// Ask the backend for a JSON-only response
    pub force_json: bool,
    /// Include existing tags as hints in the prompt
    pub use_existing_context: bool,
}

impl InferenceOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            force_json: true,
            use_existing_context: true,
        }
    }
}

/// Metadata inference client
pub struct InferenceClient {
    transport: Arc<dyn InferenceTransport>,
    options: InferenceOptions,
}

impl InferenceClient {
    pub fn new(transport: Arc<dyn InferenceTransport>, options: InferenceOptions) -> Self {
        Self { transport, options }
    }

    /// Infer metadata for `key`
    ///
    /// `existing` is forwarded as hints when context is enabled; only its
    /// non-empty fields are included.
    pub async fn infer(
        &self,
        key: &QueryKey,
        existing: Option<&ExistingMetadata>,
    ) -> InferredMetadata {
        let existing = existing.filter(|_| self.options.use_existing_context);
        let request = InferenceRequest {
            model: self.options.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(key, existing),
            force_json: self.options.force_json,
        };

        let raw = match self.transport.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    backend = self.transport.name(),
                    "Error getting metadata for '{}': {}", key, e
                );
                return InferredMetadata::fallback(key, e.to_string());
            }
        };

        match extract_json_object(&raw) {
            Some(object) => {
                let metadata = coerce_metadata(&object);
                debug!("Got metadata for '{}': {:?}", key, metadata);
                metadata
            }
            None => {
                error!("Failed to parse JSON from backend response for '{}'", key);
                error!("Raw response: {}", raw);
                InferredMetadata::fallback(key, "Failed to parse response")
            }
        }
    }
}

/// Build the user prompt for `key`
pub fn build_prompt(key: &QueryKey, existing: Option<&ExistingMetadata>) -> String {
    let mut prompt = format!(
        "I need detailed metadata for the song titled \"{}\".\n\n\
         Please provide the following information:\n\
         - title: The full and correct title of the song\n\
         - artists: The performers/singers of the song \
         (as a single comma-separated string, not an array)\n\
         - album: The album name or compilation it's from\n\
         - year: The release year (as a number)\n\
         - composer: The composer/producer/music director\n\
         - genre: The primary genre of the song\n\
         - language: The language of the song's lyrics (if applicable)\n\n\
         Return your response ONLY as a JSON object with exactly these fields: \
         title, artists, album, year, composer, genre, language. \
         If you cannot determine a field at all, use null for its value.\n",
        key
    );

    let hints = existing.map(ExistingMetadata::hints).unwrap_or_default();
    if !hints.is_empty() {
        prompt.push_str("\nThe file already carries these tags:\n");
        for (field, value) in &hints {
            let _ = writeln!(prompt, "- {}: {}", field.label().to_lowercase(), value);
        }
        prompt.push_str(
            "Keep these existing values when they are correct, and fix them when they are not. \
             Do not repeat the artist name inside the title.\n",
        );
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_EXAMPLES);
    prompt
}

/// Parse `raw` as a JSON object, falling back to the widest `{...}` span
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(object);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Coerce an untrusted JSON object into the normalised record
pub fn coerce_metadata(object: &Map<String, Value>) -> InferredMetadata {
    let field = |name: &str| object.get(name).and_then(coerce_text);

    InferredMetadata {
        title: field("title"),
        artists: object
            .get("artists")
            .or_else(|| object.get("artist"))
            .and_then(coerce_text),
        album: field("album"),
        year: object.get("year").and_then(coerce_year),
        composer: field("composer"),
        genre: field("genre"),
        language: field("language"),
        error: field("error"),
    }
}

/// Strings pass through, numbers and booleans are rendered, lists are joined
/// with `", "`; null and blank values are absent
fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(coerce_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => {
            warn!("Ignoring nested object in metadata response: {}", value);
            return None;
        }
    };
    Some(text).filter(|t| !t.is_empty())
}

/// Years are numbers; integral floats drop their fraction
fn coerce_year(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        other => coerce_text(other),
    }
}
