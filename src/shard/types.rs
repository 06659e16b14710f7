use serde::{Deserialize, Serialize};

/// Abstracts longer than this many characters are cut in hits.
pub const SNIPPET_MAX_CHARS: usize = 200;
/// Appended to a snippet that was cut.
pub const ELLIPSIS: &str = "...";

/// A single record of a shard's collection. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Category, e.g. an arXiv subject class. Missing labels load as empty.
    #[serde(default)]
    pub label: String,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            label: label.into(),
        }
    }
}

/// A matching document as reported to the coordinator and, after merging, to
/// the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    /// Abstract cut to [`SNIPPET_MAX_CHARS`] characters.
    #[serde(rename = "abstract")]
    pub snippet: String,
    pub label: String,
    /// Identifier of the shard that produced the hit.
    pub shard: String,
}

impl SearchHit {
    pub fn from_document(document: &Document, shard: &str) -> Self {
        Self {
            title: document.title.clone(),
            snippet: snippet(&document.abstract_text),
            label: document.label.clone(),
            shard: shard.to_string(),
        }
    }
}

/// First [`SNIPPET_MAX_CHARS`] characters of `text`, followed by [`ELLIPSIS`]
/// only when something was cut.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
