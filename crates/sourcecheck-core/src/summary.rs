//! Per-source aggregation of match segments.
//!
//! [`summarize`] folds segments into [`SourceSummary`] rows; [`fold_summaries`]
//! runs the same fold over rows that were already aggregated, which is what
//! the result merger needs. Both return rows sorted by `total_overlap`
//! descending, ties broken by source id ascending.

use std::collections::HashMap;

use crate::models::{MatchSegment, SourceSummary};

/// Aggregate segments by source id.
pub fn summarize(matches: &[MatchSegment]) -> Vec<SourceSummary> {
    let mut acc = SummaryAccumulator::default();
    for m in matches {
        acc.add(SourceSummary {
            id: m.source_id.clone(),
            title: m.source_title.clone(),
            url: m.source_url.clone(),
            match_count: 1,
            total_overlap: m.len(),
        });
    }
    acc.finish()
}

/// Merge two summary lists, summing rows that share a source id.
///
/// Title and URL come from the first row seen for an id.
pub fn fold_summaries(base: Vec<SourceSummary>, extra: Vec<SourceSummary>) -> Vec<SourceSummary> {
    let mut acc = SummaryAccumulator::default();
    for row in base.into_iter().chain(extra) {
        acc.add(row);
    }
    acc.finish()
}

/// Sort rows by `total_overlap` descending, then id ascending.
pub fn sort_summaries(rows: &mut [SourceSummary]) {
    rows.sort_by(|a, b| {
        b.total_overlap
            .cmp(&a.total_overlap)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Default)]
struct SummaryAccumulator {
    rows: Vec<SourceSummary>,
    by_id: HashMap<String, usize>,
}

impl SummaryAccumulator {
    fn add(&mut self, row: SourceSummary) {
        match self.by_id.get(&row.id) {
            Some(&i) => {
                let entry = &mut self.rows[i];
                entry.match_count += row.match_count;
                entry.total_overlap += row.total_overlap;
            }
            None => {
                self.by_id.insert(row.id.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    fn finish(mut self) -> Vec<SourceSummary> {
        sort_summaries(&mut self.rows);
        self.rows
    }
}
