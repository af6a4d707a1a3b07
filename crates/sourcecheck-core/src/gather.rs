//! Web source gatherer interface.
//!
//! The gatherer is the only I/O-bound collaborator of the detector. It
//! derives search queries from the input text, searches, fetches pages,
//! strips markup, and returns ad-hoc [`SourceDocument`]s. Concrete
//! implementations live in the `sourcecheck` app crate.
//!
//! The boundary is infallible: a gatherer that fails returns an empty (or
//! partial) list, so for the detector a failed gather is indistinguishable
//! from "no additional sources found".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::SourceDocument;

/// Per-request overrides for a gather run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherOptions {
    /// Maximum number of search queries derived from the text.
    pub max_queries: Option<usize>,
    /// Maximum number of result pages fetched per query.
    pub results_per_query: Option<usize>,
}

impl GatherOptions {
    /// Fill unset fields from `defaults`.
    pub fn or(self, defaults: GatherOptions) -> GatherOptions {
        GatherOptions {
            max_queries: self.max_queries.or(defaults.max_queries),
            results_per_query: self.results_per_query.or(defaults.results_per_query),
        }
    }
}

/// Collects additional reference documents for one input text.
#[async_trait]
pub trait WebGatherer: Send + Sync {
    /// Gather documents related to `text`. Never fails; errors are logged
    /// by the implementation and yield fewer documents.
    async fn gather(&self, text: &str, options: &GatherOptions) -> Vec<SourceDocument>;
}

/// A gatherer that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGatherer;

#[async_trait]
impl WebGatherer for NoopGatherer {
    async fn gather(&self, _text: &str, _options: &GatherOptions) -> Vec<SourceDocument> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_or_prefers_explicit() {
        let defaults = GatherOptions {
            max_queries: Some(3),
            results_per_query: Some(3),
        };
        let explicit = GatherOptions {
            max_queries: Some(1),
            results_per_query: None,
        };
        let merged = explicit.or(defaults);
        assert_eq!(merged.max_queries, Some(1));
        assert_eq!(merged.results_per_query, Some(3));
    }

    #[test]
    fn test_options_json_shape() {
        let opts: GatherOptions =
            serde_json::from_str(r#"{"maxQueries": 2, "resultsPerQuery": 5}"#).unwrap();
        assert_eq!(opts.max_queries, Some(2));
        assert_eq!(opts.results_per_query, Some(5));
    }
}
