//! Per-document shingle index.
//!
//! Each [`SourceIndex`] owns its [`SourceDocument`], the document's
//! shingles in text order, and a fingerprint → occurrences map. A
//! fingerprint may repeat inside one document (boilerplate, refrains);
//! every occurrence is kept.

use std::collections::HashMap;

use crate::models::{Fingerprint, Shingle, SourceDocument};
use crate::params::DetectParams;
use crate::shingle::build_shingles_with;
use crate::tokenize::tokenize;

/// Precomputed shingles for one reference document.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    pub source: SourceDocument,
    pub shingles: Vec<Shingle>,
    shingle_map: HashMap<Fingerprint, Vec<Shingle>>,
}

impl SourceIndex {
    /// Tokenize, shingle, and index one document.
    pub fn build(source: SourceDocument, params: &DetectParams) -> Self {
        let shingles = build_shingles_with(&tokenize(&source.content), params.shingle_size);
        let mut shingle_map: HashMap<Fingerprint, Vec<Shingle>> = HashMap::new();
        for sh in &shingles {
            shingle_map.entry(sh.hash).or_default().push(*sh);
        }
        Self {
            source,
            shingles,
            shingle_map,
        }
    }

    /// All occurrences of `hash` in this document, in text order.
    pub fn lookup(&self, hash: &Fingerprint) -> &[Shingle] {
        self.shingle_map
            .get(hash)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct fingerprints in the document.
    pub fn distinct_fingerprints(&self) -> usize {
        self.shingle_map.len()
    }
}

/// Build one index per source using default parameters.
pub fn build_index(sources: Vec<SourceDocument>) -> Vec<SourceIndex> {
    build_index_with(sources, &DetectParams::default())
}

/// Build one index per source.
pub fn build_index_with(sources: Vec<SourceDocument>, params: &DetectParams) -> Vec<SourceIndex> {
    sources
        .into_iter()
        .map(|s| SourceIndex::build(s, params))
        .collect()
}
