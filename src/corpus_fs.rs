//! Filesystem corpus provider.
//!
//! Walks a directory tree and turns every matching file into a
//! [`SourceDocument`]. Text files are read as UTF-8; PDF and DOCX go
//! through [`crate::extract`]. Files that cannot be read or extracted are
//! skipped with a warning rather than failing the whole load.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sourcecheck_core::{CorpusProvider, SourceDocument};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::extract::{content_type_for_path, extract_text, is_binary_content_type};

/// Reference documents read from a directory tree.
pub struct FsCorpus {
    config: CorpusConfig,
    label: String,
}

impl FsCorpus {
    pub fn new(config: CorpusConfig) -> Self {
        let label = format!("filesystem:{}", config.root.display());
        Self { config, label }
    }
}

impl CorpusProvider for FsCorpus {
    fn name(&self) -> &str {
        &self.label
    }

    fn static_sources(&self) -> Result<Vec<SourceDocument>> {
        scan_corpus(&self.config)
    }
}

/// Load every matching file under `config.root`, sorted by relative path.
pub fn scan_corpus(config: &CorpusConfig) -> Result<Vec<SourceDocument>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut docs = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size > config.max_file_bytes {
            warn!(path = %rel_str, size, "skipping oversized corpus file");
            continue;
        }

        match file_to_document(path, &rel_str) {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => debug!(path = %rel_str, "skipping empty corpus file"),
            Err(e) => warn!(path = %rel_str, error = %e, "skipping unreadable corpus file"),
        }
    }

    // Sort for deterministic ordering
    docs.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(docs)
}

fn file_to_document(path: &Path, relative_path: &str) -> Result<Option<SourceDocument>> {
    let content_type = content_type_for_path(path);
    let content = if is_binary_content_type(content_type) {
        let bytes = std::fs::read(path)?;
        extract_text(&bytes, content_type)?
    } else {
        std::fs::read_to_string(path)?
    };
    if content.trim().is_empty() {
        return Ok(None);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| relative_path.to_string());
    let title = first_heading(&content).unwrap_or(file_name);

    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    Ok(Some(SourceDocument::new(
        relative_path,
        title,
        format!("file://{}", abs.display()),
        content,
    )))
}

/// The text of the first `# ` heading, if any.
fn first_heading(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("# "))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_heading() {
        assert_eq!(
            first_heading("intro\n# Title Here \nbody"),
            Some("Title Here".to_string())
        );
        assert_eq!(first_heading("## Sub\nbody"), None);
        assert_eq!(first_heading("#\n"), None);
    }

    #[test]
    fn test_invalid_glob_is_error() {
        assert!(build_globset(&["[".to_string()]).is_err());
    }
}
