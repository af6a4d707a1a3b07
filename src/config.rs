//! TOML configuration parsing and validation.
//!
//! Every section is optional; an empty file yields a working config that
//! checks text against an empty corpus with web gathering disabled.
//!
//! ```toml
//! [detection]
//! shingle_size = 6
//! merge_gap = 20
//! min_match_chars = 20
//! snippet_padding = 80
//!
//! [corpus]
//! root = "./corpus"
//! include_globs = ["**/*.md", "**/*.txt", "**/*.pdf", "**/*.docx"]
//!
//! [web]
//! enabled = true
//! search_url = "https://html.duckduckgo.com/html/?q={query}"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use sourcecheck_core::{DetectParams, GatherOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub corpus: Option<CorpusConfig>,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
    #[serde(default = "default_merge_gap")]
    pub merge_gap: usize,
    #[serde(default = "default_min_match_chars")]
    pub min_match_chars: usize,
    #[serde(default = "default_snippet_padding")]
    pub snippet_padding: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let p = DetectParams::default();
        Self {
            shingle_size: p.shingle_size,
            merge_gap: p.merge_gap,
            min_match_chars: p.min_match_chars,
            snippet_padding: p.snippet_padding,
        }
    }
}

impl DetectionConfig {
    pub fn params(&self) -> DetectParams {
        DetectParams {
            shingle_size: self.shingle_size,
            merge_gap: self.merge_gap,
            min_match_chars: self.min_match_chars,
            snippet_padding: self.snippet_padding,
        }
    }
}

fn default_shingle_size() -> usize {
    DetectParams::default().shingle_size
}
fn default_merge_gap() -> usize {
    DetectParams::default().merge_gap
}
fn default_min_match_chars() -> usize {
    DetectParams::default().min_match_chars
}
fn default_snippet_padding() -> usize {
    DetectParams::default().snippet_padding
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}
fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Search endpoint returning HTML; `{query}` is replaced by the
    /// URL-encoded query.
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_url: default_search_url(),
            result_selector: default_result_selector(),
            max_queries: default_max_queries(),
            results_per_query: default_results_per_query(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_page_bytes: default_max_page_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl WebConfig {
    pub fn gather_defaults(&self) -> GatherOptions {
        GatherOptions {
            max_queries: Some(self.max_queries),
            results_per_query: Some(self.results_per_query),
        }
    }
}

fn default_search_url() -> String {
    "https://html.duckduckgo.com/html/?q={query}".to_string()
}
fn default_result_selector() -> String {
    "a.result__a".to_string()
}
fn default_max_queries() -> usize {
    3
}
fn default_results_per_query() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    2
}
fn default_max_page_bytes() -> usize {
    2_000_000
}
fn default_user_agent() -> String {
    concat!("sourcecheck/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}
fn default_max_text_bytes() -> usize {
    1_000_000
}

impl Config {
    /// Defaults for every section: empty corpus, web disabled.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate detection
    if config.detection.shingle_size == 0 {
        anyhow::bail!("detection.shingle_size must be > 0");
    }

    // Validate web
    if !config.web.search_url.contains("{query}") {
        anyhow::bail!("web.search_url must contain a {{query}} placeholder");
    }
    if config.web.max_queries == 0 {
        anyhow::bail!("web.max_queries must be >= 1");
    }
    if config.web.results_per_query == 0 {
        anyhow::bail!("web.results_per_query must be >= 1");
    }

    // Validate server
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}
