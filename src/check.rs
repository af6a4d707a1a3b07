//! Check orchestration: gather, detect, report.
//!
//! [`Checker`] owns the memoized corpus [`Detector`] and the web gatherer,
//! and is shared by the CLI and the HTTP server. A check optionally gathers
//! web sources, appends caller-supplied sources and runs detection on a
//! blocking thread.

use anyhow::{Context, Result};
use serde::Deserialize;
use sourcecheck_core::{
    CorpusIndex, CorpusProvider, DetectionResult, Detector, GatherOptions, NoopGatherer,
    SourceDocument, StaticCorpus, WebGatherer,
};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::corpus_fs::FsCorpus;
use crate::web::HttpWebGatherer;

/// One check: the text plus optional per-request settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub text: String,
    /// Gather web sources for this request.
    #[serde(default, rename = "web")]
    pub use_web: bool,
    /// Extra reference documents compared alongside the corpus.
    #[serde(default)]
    pub sources: Vec<SourceDocument>,
    #[serde(default)]
    pub max_queries: Option<usize>,
    #[serde(default)]
    pub results_per_query: Option<usize>,
}

impl CheckRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn gather_options(&self) -> GatherOptions {
        GatherOptions {
            max_queries: self.max_queries,
            results_per_query: self.results_per_query,
        }
    }
}

pub struct Checker {
    detector: Arc<Detector>,
    gatherer: Arc<dyn WebGatherer>,
    web_defaults: GatherOptions,
}

impl Checker {
    pub fn new(
        detector: Detector,
        gatherer: Arc<dyn WebGatherer>,
        web_defaults: GatherOptions,
    ) -> Self {
        Self {
            detector: Arc::new(detector),
            gatherer,
            web_defaults,
        }
    }

    /// Wire the filesystem corpus (or an empty one when `[corpus]` is
    /// absent) and the HTTP gatherer (or none when `web.enabled = false`).
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn CorpusProvider> = match &config.corpus {
            Some(corpus) => Arc::new(FsCorpus::new(corpus.clone())),
            None => Arc::new(StaticCorpus::empty()),
        };
        let gatherer: Arc<dyn WebGatherer> = if config.web.enabled {
            Arc::new(HttpWebGatherer::new(config.web.clone())?)
        } else {
            Arc::new(NoopGatherer)
        };
        let detector = Detector::new(provider, config.detection.params());
        Ok(Self::new(detector, gatherer, config.web.gather_defaults()))
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Run one check.
    ///
    /// Errors only when the corpus cannot be loaded on first use; web
    /// failures reduce to fewer sources.
    pub async fn check(&self, request: &CheckRequest) -> Result<DetectionResult> {
        let mut sources = if request.use_web {
            let options = request.gather_options().or(self.web_defaults);
            self.gatherer.gather(&request.text, &options).await
        } else {
            Vec::new()
        };
        debug!(
            web_sources = sources.len(),
            request_sources = request.sources.len(),
            "check sources collected"
        );
        sources.extend(request.sources.iter().cloned());

        let detector = self.detector.clone();
        let text = request.text.clone();
        tokio::task::spawn_blocking(move || detector.detect_matches(&text, sources))
            .await
            .context("detection task failed")?
    }

    /// Re-read the corpus and swap in a fresh index.
    pub fn reload_corpus(&self) -> Result<Arc<CorpusIndex>> {
        self.detector.corpus().rebuild()
    }

    /// The current corpus index, building it if needed.
    pub fn corpus(&self) -> Result<Arc<CorpusIndex>> {
        self.detector.corpus().snapshot()
    }
}

/// Read the input named on the command line: a path, or `-` for stdin.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

/// `srccheck check`: check one document and print the result.
pub async fn run_check(
    config: &Config,
    input: &str,
    use_web: bool,
    options: GatherOptions,
    json: bool,
) -> Result<()> {
    let text = read_input(input)?;

    // --web turns gathering on even when the config leaves it off.
    let mut config = config.clone();
    if use_web {
        config.web.enabled = true;
    }
    let checker = Checker::from_config(&config)?;

    let request = CheckRequest {
        text,
        use_web,
        sources: Vec::new(),
        max_queries: options.max_queries,
        results_per_query: options.results_per_query,
    };
    let result = checker.check(&request).await?;
    info!(
        matches = result.matches.len(),
        sources = result.summary.len(),
        "check complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&request.text, &result);
    }
    Ok(())
}

fn print_report(text: &str, result: &DetectionResult) {
    if result.is_empty() {
        println!("No overlapping passages found.");
        return;
    }

    let covered: usize = result.matches.iter().map(|m| m.len()).sum();
    println!(
        "{} matching passage(s) from {} source(s), {} of {} bytes",
        result.matches.len(),
        result.summary.len(),
        covered,
        text.len()
    );
    println!();
    println!(
        "  {:<28} {:>7} {:>9}   {}",
        "SOURCE", "MATCHES", "OVERLAP", "TITLE"
    );
    println!("  {}", "-".repeat(76));
    for s in &result.summary {
        println!(
            "  {:<28} {:>7} {:>9}   {}",
            s.id, s.match_count, s.total_overlap, s.title
        );
    }
    println!();

    for (i, m) in result.matches.iter().enumerate() {
        println!(
            "{}. [{:.1}%] {} / {}",
            i + 1,
            m.overlap_ratio * 100.0,
            m.source_id,
            m.source_title
        );
        println!("    range: {}..{}", m.start, m.end);
        if !m.source_url.is_empty() {
            println!("    url: {}", m.source_url);
        }
        println!(
            "    matched: \"{}\"",
            m.matched_text.replace('\n', " ").trim()
        );
        println!("    source: \"{}\"", m.snippet.replace('\n', " ").trim());
        println!();
    }
}

/// `srccheck corpus`: list indexed corpus documents.
pub async fn run_corpus(config: &Config) -> Result<()> {
    let checker = Checker::from_config(config)?;
    let index = checker.corpus()?;

    if index.indexes.is_empty() {
        println!("Corpus is empty.");
        return Ok(());
    }

    println!(
        "  {:<40} {:>9} {:>9}   {}",
        "ID", "SHINGLES", "DISTINCT", "TITLE"
    );
    println!("  {}", "-".repeat(76));
    for idx in &index.indexes {
        println!(
            "  {:<40} {:>9} {:>9}   {}",
            idx.source.id,
            idx.shingles.len(),
            idx.distinct_fingerprints(),
            idx.source.title
        );
    }
    println!();
    println!(
        "  {} document(s), {} shingle(s)",
        index.source_count(),
        index.shingle_count()
    );
    Ok(())
}
