//! Overlap detector: input text vs. one or more source indexes.
//!
//! # Algorithm
//!
//! 1. Tokenize and shingle the input. No shingles → empty result.
//! 2. Probe every index with every input shingle. Each hit is a raw
//!    candidate carrying the input span and the matching source span.
//! 3. Stable-sort candidates by input start.
//! 4. Collapse candidates into segments. Each source has at most one open
//!    segment; a candidate extends it when it starts no more than
//!    `merge_gap` bytes past the segment's end, otherwise the source gets a
//!    fresh segment. Candidates from different sources never merge, even
//!    when they cover the same input offsets.
//! 5. Cut `matched_text` from the input, compute the overlap ratio, and
//!    drop segments whose trimmed text is `min_match_chars` or shorter.
//! 6. Aggregate surviving segments per source (see [`crate::summary`]).
//!
//! Detection is pure and total: degenerate inputs return an empty
//! [`DetectionResult`], never an error.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::index::SourceIndex;
use crate::models::{DetectionResult, MatchSegment};
use crate::params::DetectParams;
use crate::shingle::build_shingles_with;
use crate::summary::summarize;
use crate::tokenize::tokenize;

/// One fingerprint collision between the input and a source.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Position of the source in the `indexes` slice.
    index: usize,
    input_start: usize,
    input_end: usize,
    source_start: usize,
    source_end: usize,
}

/// A segment under construction.
///
/// `index`, `source_start` and `source_end` track the latest candidate
/// folded in, so the snippet reflects the most recent source hit.
#[derive(Debug, Clone, Copy)]
struct OpenSegment {
    index: usize,
    start: usize,
    end: usize,
    source_start: usize,
    source_end: usize,
}

/// Greedy single-pass collapser, scoped per source id.
struct SegmentBuilder<'a> {
    indexes: &'a [SourceIndex],
    merge_gap: usize,
    segments: Vec<OpenSegment>,
    open: HashMap<&'a str, usize>,
}

impl<'a> SegmentBuilder<'a> {
    fn new(indexes: &'a [SourceIndex], merge_gap: usize) -> Self {
        Self {
            indexes,
            merge_gap,
            segments: Vec::new(),
            open: HashMap::new(),
        }
    }

    fn push(&mut self, c: Candidate) {
        let source_id = self.indexes[c.index].source.id.as_str();

        if let Some(&slot) = self.open.get(source_id) {
            let seg = &mut self.segments[slot];
            if c.input_start <= seg.end + self.merge_gap {
                seg.end = seg.end.max(c.input_end);
                seg.index = c.index;
                seg.source_start = c.source_start;
                seg.source_end = c.source_end;
                return;
            }
        }

        self.open.insert(source_id, self.segments.len());
        self.segments.push(OpenSegment {
            index: c.index,
            start: c.input_start,
            end: c.input_end,
            source_start: c.source_start,
            source_end: c.source_end,
        });
    }

    fn finish(self) -> Vec<OpenSegment> {
        self.segments
    }
}

/// Compare `text` against `indexes` with default parameters.
pub fn compare_against_indexes(text: &str, indexes: &[SourceIndex]) -> DetectionResult {
    compare_against_indexes_with(text, indexes, &DetectParams::default())
}

/// Compare `text` against `indexes`, returning filtered segments and the
/// per-source summary.
pub fn compare_against_indexes_with(
    text: &str,
    indexes: &[SourceIndex],
    params: &DetectParams,
) -> DetectionResult {
    let input_shingles = build_shingles_with(&tokenize(text), params.shingle_size);
    if input_shingles.is_empty() || indexes.is_empty() {
        return DetectionResult::empty();
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for sh in &input_shingles {
        for (i, idx) in indexes.iter().enumerate() {
            for hit in idx.lookup(&sh.hash) {
                candidates.push(Candidate {
                    index: i,
                    input_start: sh.start,
                    input_end: sh.end,
                    source_start: hit.start,
                    source_end: hit.end,
                });
            }
        }
    }

    if candidates.is_empty() {
        debug!(
            shingles = input_shingles.len(),
            sources = indexes.len(),
            "no fingerprint collisions"
        );
        return DetectionResult::empty();
    }

    // `sort_by_key` is stable: ties keep discovery order.
    candidates.sort_by_key(|c| c.input_start);

    let mut builder = SegmentBuilder::new(indexes, params.merge_gap);
    for c in &candidates {
        builder.push(*c);
    }
    let open_segments = builder.finish();

    let denom = text.len().max(1) as f64;
    let matches: Vec<MatchSegment> = open_segments
        .into_iter()
        .filter_map(|seg| {
            let matched_text = &text[seg.start..seg.end];
            if matched_text.trim().chars().count() <= params.min_match_chars {
                return None;
            }
            let source = &indexes[seg.index].source;
            Some(MatchSegment {
                id: Uuid::new_v4(),
                source_id: source.id.clone(),
                source_title: source.title.clone(),
                source_url: source.url.clone(),
                snippet: padded_excerpt(
                    &source.content,
                    seg.source_start,
                    seg.source_end,
                    params.snippet_padding,
                ),
                matched_text: matched_text.to_string(),
                start: seg.start,
                end: seg.end,
                overlap_ratio: (seg.end - seg.start) as f64 / denom,
            })
        })
        .collect();

    debug!(
        shingles = input_shingles.len(),
        candidates = candidates.len(),
        segments = matches.len(),
        "overlap detection finished"
    );

    let summary = summarize(&matches);
    DetectionResult { matches, summary }
}

/// Excerpt of `content` covering `[start, end)` plus `padding` characters
/// of context on each side, clamped to the document.
pub fn padded_excerpt(content: &str, start: usize, end: usize, padding: usize) -> String {
    let from = chars_back(content, start, padding);
    let to = chars_forward(content, end, padding);
    content[from..to].to_string()
}

/// Byte offset `n` characters before `from` (or 0).
fn chars_back(s: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    s[..from]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(from)
}

/// Byte offset `n` characters after `from` (or the end of `s`).
fn chars_forward(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(s.len())
}
