//! # SourceCheck Core
//!
//! Pure, I/O-free text overlap detection: tokenizer, shingle
//! fingerprints, per-source index, match detector, per-source summary,
//! result merging, and the memoized static-corpus index.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. The
//! web gatherer is described here only as a trait ([`gather::WebGatherer`]).
//!
//! ## Pipeline
//!
//! ```text
//! text ─▶ tokenize ─▶ build_shingles ─▶ probe SourceIndex(es) ─▶ collapse
//!                                                                  │
//!      DetectionResult { matches, summary } ◀── merge ◀── summarize ┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sourcecheck_core::{build_index, compare_against_indexes, SourceDocument};
//!
//! let sources = vec![SourceDocument::new(
//!     "s1",
//!     "Fox",
//!     "https://example.com/fox",
//!     "The quick brown fox jumps over the lazy dog every single morning without fail.",
//! )];
//! let index = build_index(sources);
//! let result = compare_against_indexes(
//!     "Yesterday, the quick brown fox jumps over the lazy dog every single morning without fail.",
//!     &index,
//! );
//! assert_eq!(result.matches.len(), 1);
//! assert_eq!(result.summary[0].id, "s1");
//! ```

pub mod corpus;
pub mod detect;
pub mod gather;
pub mod index;
pub mod merge;
pub mod models;
pub mod params;
pub mod shingle;
pub mod summary;
pub mod tokenize;

pub use corpus::{
    detect_with_index, CorpusIndex, CorpusIndexHandle, CorpusProvider, Detector, StaticCorpus,
};
pub use detect::{compare_against_indexes, compare_against_indexes_with};
pub use gather::{GatherOptions, NoopGatherer, WebGatherer};
pub use index::{build_index, build_index_with, SourceIndex};
pub use merge::{merge, merge_all};
pub use models::{
    DetectionResult, Fingerprint, MatchSegment, Shingle, SourceDocument, SourceSummary, Token,
};
pub use params::DetectParams;
pub use shingle::{build_shingles, build_shingles_with};
pub use summary::{fold_summaries, summarize};
pub use tokenize::tokenize;
