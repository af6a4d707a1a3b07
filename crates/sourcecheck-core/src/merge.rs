//! Merging results produced against independent indexes.
//!
//! The static corpus and the per-request web sources are compared in
//! separate passes; [`merge`] combines the two into one result. The
//! summary half is commutative and associative. The order of `matches`
//! follows merge order and carries no meaning.

use crate::models::DetectionResult;
use crate::summary::fold_summaries;

/// Concatenate matches (`base` first) and sum summaries by source id.
pub fn merge(base: DetectionResult, extra: DetectionResult) -> DetectionResult {
    let mut matches = base.matches;
    matches.extend(extra.matches);
    DetectionResult {
        matches,
        summary: fold_summaries(base.summary, extra.summary),
    }
}

/// Merge any number of results left to right.
pub fn merge_all<I>(results: I) -> DetectionResult
where
    I: IntoIterator<Item = DetectionResult>,
{
    results
        .into_iter()
        .fold(DetectionResult::empty(), merge)
}
