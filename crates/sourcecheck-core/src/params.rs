//! Detection tuning parameters.

use serde::{Deserialize, Serialize};

/// Number of consecutive tokens fingerprinted together.
pub const SHINGLE_SIZE: usize = 6;

/// Maximum distance (bytes) between a segment's end and the next hit from
/// the same source for the two to be collapsed into one segment.
pub const MERGE_GAP: usize = 20;

/// Segments whose trimmed text has this many characters or fewer are noise.
pub const MIN_MATCH_CHARS: usize = 20;

/// Characters of source context kept on each side of a snippet.
pub const SNIPPET_PADDING: usize = 80;

/// Tuning knobs for shingling and segment collapsing.
///
/// The defaults are the values the detector is calibrated against; the
/// application config may override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectParams {
    pub shingle_size: usize,
    pub merge_gap: usize,
    pub min_match_chars: usize,
    pub snippet_padding: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            shingle_size: SHINGLE_SIZE,
            merge_gap: MERGE_GAP,
            min_match_chars: MIN_MATCH_CHARS,
            snippet_padding: SNIPPET_PADDING,
        }
    }
}
