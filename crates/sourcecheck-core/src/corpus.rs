//! Memoized static-corpus index and the primary detection entry point.
//!
//! The static corpus is indexed once and then shared read-only by every
//! request. [`CorpusIndexHandle`] holds the current index behind
//! `RwLock<Option<Arc<CorpusIndex>>>`:
//!
//! - readers hold the read lock only long enough to clone the `Arc`, then
//!   work on that snapshot without any lock;
//! - a rebuild reads the provider and builds a complete new index outside
//!   the lock, then swaps the pointer under a short write lock. Rebuilds are
//!   serialized by a separate mutex so there is a single writer.
//!
//! An index is never mutated after construction.
//!
//! ```text
//! CorpusProvider ──▶ build_index ──▶ Arc<CorpusIndex> ──┐
//!                                                        ▼
//! text + additional sources ──▶ Detector::detect_matches ──▶ DetectionResult
//!                                  │   (static pass)          ▲
//!                                  └──▶ ad-hoc index pass ──merge
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Result;
use tracing::{debug, info};

use crate::detect::compare_against_indexes_with;
use crate::index::{build_index_with, SourceIndex};
use crate::merge::merge;
use crate::models::{DetectionResult, SourceDocument};
use crate::params::DetectParams;

/// Supplies the fixed list of reference documents known ahead of time.
///
/// Called once on first use and again on every explicit rebuild.
pub trait CorpusProvider: Send + Sync {
    /// Short label used in logs (e.g. `"filesystem:./corpus"`).
    fn name(&self) -> &str;

    /// Load every reference document.
    fn static_sources(&self) -> Result<Vec<SourceDocument>>;
}

/// An in-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
    sources: Vec<SourceDocument>,
}

impl StaticCorpus {
    pub fn new(sources: Vec<SourceDocument>) -> Self {
        Self { sources }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl CorpusProvider for StaticCorpus {
    fn name(&self) -> &str {
        "static"
    }

    fn static_sources(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.sources.clone())
    }
}

/// An immutable, fully built set of source indexes.
#[derive(Debug)]
pub struct CorpusIndex {
    pub indexes: Vec<SourceIndex>,
    /// Monotonic build counter; the first build is generation 1.
    pub generation: u64,
}

impl CorpusIndex {
    pub fn source_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn shingle_count(&self) -> usize {
        self.indexes.iter().map(|i| i.shingles.len()).sum()
    }
}

/// Lazily built, atomically swappable handle to the static corpus index.
pub struct CorpusIndexHandle {
    provider: Arc<dyn CorpusProvider>,
    params: DetectParams,
    current: RwLock<Option<Arc<CorpusIndex>>>,
    writer: Mutex<()>,
    generation: AtomicU64,
}

impl CorpusIndexHandle {
    /// Create a handle. Nothing is loaded until the first [`snapshot`](Self::snapshot).
    pub fn new(provider: Arc<dyn CorpusProvider>, params: DetectParams) -> Self {
        Self {
            provider,
            params,
            current: RwLock::new(None),
            writer: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn params(&self) -> &DetectParams {
        &self.params
    }

    /// The current index, building it on first use.
    pub fn snapshot(&self) -> Result<Arc<CorpusIndex>> {
        if let Some(idx) = self.peek() {
            return Ok(idx);
        }
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished the first build while we waited.
        if let Some(idx) = self.peek() {
            return Ok(idx);
        }
        let sources = self.provider.static_sources()?;
        Ok(self.install(sources))
    }

    /// The current index if one has been built, without triggering a build.
    pub fn peek(&self) -> Option<Arc<CorpusIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the provider and swap in a freshly built index.
    ///
    /// On provider failure the previous index stays in place.
    pub fn rebuild(&self) -> Result<Arc<CorpusIndex>> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let sources = self.provider.static_sources()?;
        Ok(self.install(sources))
    }

    /// Swap in an index built from an explicit document list.
    pub fn replace(&self, sources: Vec<SourceDocument>) -> Arc<CorpusIndex> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.install(sources)
    }

    /// Build outside the read/write lock, then publish. Caller holds `writer`.
    fn install(&self, sources: Vec<SourceDocument>) -> Arc<CorpusIndex> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let index = Arc::new(CorpusIndex {
            indexes: build_index_with(sources, &self.params),
            generation,
        });
        info!(
            provider = self.provider.name(),
            generation,
            sources = index.source_count(),
            shingles = index.shingle_count(),
            "corpus index built"
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(index.clone());
        index
    }
}

/// Primary detection entry point: static corpus plus ad-hoc sources.
pub struct Detector {
    corpus: CorpusIndexHandle,
}

impl Detector {
    pub fn new(provider: Arc<dyn CorpusProvider>, params: DetectParams) -> Self {
        Self {
            corpus: CorpusIndexHandle::new(provider, params),
        }
    }

    pub fn corpus(&self) -> &CorpusIndexHandle {
        &self.corpus
    }

    pub fn params(&self) -> &DetectParams {
        self.corpus.params()
    }

    /// Compare `text` against the memoized corpus and, when given, an index
    /// built fresh from `additional_sources`; merge the two results.
    ///
    /// The only error is a corpus provider failure during the first build.
    pub fn detect_matches(
        &self,
        text: &str,
        additional_sources: Vec<SourceDocument>,
    ) -> Result<DetectionResult> {
        let corpus = self.corpus.snapshot()?;
        Ok(detect_with_index(
            &corpus,
            text,
            additional_sources,
            self.corpus.params(),
        ))
    }
}

/// Detection against an already built corpus index. Pure.
pub fn detect_with_index(
    corpus: &CorpusIndex,
    text: &str,
    additional_sources: Vec<SourceDocument>,
    params: &DetectParams,
) -> DetectionResult {
    let base = compare_against_indexes_with(text, &corpus.indexes, params);
    if additional_sources.is_empty() {
        return base;
    }
    let extra_count = additional_sources.len();
    let adhoc = build_index_with(additional_sources, params);
    let extra = compare_against_indexes_with(text, &adhoc, params);
    debug!(
        static_matches = base.matches.len(),
        extra_sources = extra_count,
        extra_matches = extra.matches.len(),
        "merging static and ad-hoc results"
    );
    merge(base, extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingProvider {
        calls: AtomicUsize,
        docs: Vec<SourceDocument>,
    }

    impl CorpusProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn static_sources(&self) -> Result<Vec<SourceDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.docs.clone())
        }
    }

    struct FailingProvider;

    impl CorpusProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn static_sources(&self) -> Result<Vec<SourceDocument>> {
            anyhow::bail!("corpus unavailable")
        }
    }

    fn doc(id: &str, content: &str) -> SourceDocument {
        SourceDocument::new(id, id, format!("https://example.com/{}", id), content)
    }

    const FOX: &str = "The quick brown fox jumps over the lazy dog every single morning without fail.";

    #[test]
    fn test_lazy_build_once() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            docs: vec![doc("s1", FOX)],
        });
        let handle = CorpusIndexHandle::new(provider.clone(), DetectParams::default());
        assert!(handle.peek().is_none());
        let a = handle.snapshot().unwrap();
        let b = handle.snapshot().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.generation, 1);
    }

    #[test]
    fn test_rebuild_swaps_without_touching_old_snapshot() {
        let handle = CorpusIndexHandle::new(
            Arc::new(StaticCorpus::new(vec![doc("s1", FOX)])),
            DetectParams::default(),
        );
        let old = handle.snapshot().unwrap();
        let new = handle.replace(vec![doc("s2", FOX), doc("s3", FOX)]);
        assert_eq!(old.source_count(), 1);
        assert_eq!(new.source_count(), 2);
        assert_eq!(new.generation, 2);
        assert!(Arc::ptr_eq(&handle.snapshot().unwrap(), &new));

        let rebuilt = handle.rebuild().unwrap();
        assert_eq!(rebuilt.source_count(), 1);
        assert_eq!(rebuilt.generation, 3);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous() {
        let handle = CorpusIndexHandle::new(Arc::new(FailingProvider), DetectParams::default());
        assert!(handle.snapshot().is_err());
        handle.replace(vec![doc("s1", FOX)]);
        assert!(handle.rebuild().is_err());
        assert_eq!(handle.snapshot().unwrap().source_count(), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        let detector = Arc::new(Detector::new(
            Arc::new(StaticCorpus::new(vec![doc("s1", FOX)])),
            DetectParams::default(),
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = detector.clone();
                std::thread::spawn(move || {
                    d.detect_matches(
                        "Yesterday, the quick brown fox jumps over the lazy dog every single morning without fail.",
                        Vec::new(),
                    )
                    .unwrap()
                    .matches
                    .len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(detector.corpus().snapshot().unwrap().generation, 1);
    }

    #[test]
    fn test_empty_corpus_and_no_additional() {
        let detector = Detector::new(Arc::new(StaticCorpus::empty()), DetectParams::default());
        let result = detector.detect_matches(FOX, Vec::new()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_additional_sources_merged() {
        let detector = Detector::new(
            Arc::new(StaticCorpus::new(vec![doc("static", FOX)])),
            DetectParams::default(),
        );
        let result = detector
            .detect_matches(FOX, vec![doc("web", FOX)])
            .unwrap();
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].source_id, "static");
        assert_eq!(result.matches[1].source_id, "web");
        assert_eq!(result.summary.len(), 2);
    }

    #[test]
    fn test_same_id_in_both_passes_is_summed() {
        let detector = Detector::new(
            Arc::new(StaticCorpus::new(vec![doc("shared", FOX)])),
            DetectParams::default(),
        );
        let result = detector
            .detect_matches(FOX, vec![doc("shared", FOX)])
            .unwrap();
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.summary.len(), 1);
        assert_eq!(result.summary[0].match_count, 2);
        assert_eq!(result.summary[0].total_overlap, 2 * FOX.len());
    }
}
