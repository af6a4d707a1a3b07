//! Core data models used throughout SourceCheck.
//!
//! These types represent the tokens, shingles, reference documents, and
//! match results that flow through the detection pipeline. All of them are
//! created and consumed within a single detection request, except the
//! memoized corpus index (see [`crate::corpus`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A whitespace-delimited word and its byte offsets in the original text.
///
/// `start` and `end` always fall on UTF-8 char boundaries, so
/// `&text[start..end]` yields the original (un-normalized) word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub value: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Fixed-width content fingerprint of a canonicalized shingle (SHA-256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Lowercase hex rendering, used for logging and display.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprint of `K` consecutive tokens plus the byte span they cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shingle {
    pub hash: Fingerprint,
    /// Start of the first token in the window.
    pub start: usize,
    /// End of the last token in the window.
    pub end: usize,
}

/// A reference document, from the static corpus or the web gatherer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SourceDocument {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            content: content.into(),
        }
    }
}

/// A contiguous run of the input text believed to overlap one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSegment {
    pub id: Uuid,
    pub source_id: String,
    pub source_title: String,
    pub source_url: String,
    /// Padded excerpt from the source side, for human review.
    pub snippet: String,
    /// Exact input substring between `start` and `end`.
    pub matched_text: String,
    pub start: usize,
    pub end: usize,
    /// `(end - start) / max(input length, 1)`.
    pub overlap_ratio: f64,
}

impl MatchSegment {
    /// Length of the segment in the input text, in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Per-source aggregate over a set of match segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub match_count: usize,
    /// Sum of `end - start` over this source's segments.
    pub total_overlap: usize,
}

/// Output of a detection pass: match segments plus per-source ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub matches: Vec<MatchSegment>,
    pub summary: Vec<SourceSummary>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.summary.is_empty()
    }
}
