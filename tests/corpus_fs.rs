//! Filesystem corpus provider: discovery, filtering, extraction and the
//! memoized index built on top of it.

use sourcecheck::config::CorpusConfig;
use sourcecheck::corpus_fs::{scan_corpus, FsCorpus};
use sourcecheck_core::{CorpusProvider, DetectParams, Detector};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const FOX: &str = "The quick brown fox jumps over the lazy dog every single morning without fail.";

fn corpus_config(root: &Path) -> CorpusConfig {
    CorpusConfig {
        root: root.to_path_buf(),
        include_globs: vec![
            "**/*.md".to_string(),
            "**/*.txt".to_string(),
            "**/*.pdf".to_string(),
            "**/*.docx".to_string(),
        ],
        exclude_globs: Vec::new(),
        follow_symlinks: false,
        max_file_bytes: 10 * 1024 * 1024,
    }
}

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn minimal_docx_with_text(text: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            text
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

#[test]
fn scans_sorted_documents_with_titles() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "b/notes.txt", b"plain notes about nothing in particular");
    write(root, "a/essay.md", format!("# Fox Essay\n\n{}\n", FOX).as_bytes());
    write(root, "image.png", b"\x89PNG");

    let docs = scan_corpus(&corpus_config(root)).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a/essay.md", "b/notes.txt"]);

    assert_eq!(docs[0].title, "Fox Essay");
    assert_eq!(docs[1].title, "notes.txt");
    assert!(docs[0].url.starts_with("file://"));
    assert!(docs[0].url.ends_with("essay.md"));
    assert!(docs[0].content.contains("quick brown fox"));
}

#[test]
fn default_and_configured_excludes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "keep.md", b"kept document body");
    write(root, ".git/notes.md", b"git internals");
    write(root, "node_modules/pkg/README.md", b"dependency readme");
    write(root, "drafts/wip.md", b"work in progress");

    let mut config = corpus_config(root);
    config.exclude_globs = vec!["drafts/**".to_string()];
    let docs = scan_corpus(&config).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["keep.md"]);
}

#[test]
fn oversized_empty_and_broken_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "ok.md", b"small enough to index");
    write(root, "big.txt", &vec![b'x'; 4096]);
    write(root, "blank.txt", b"   \n\n");
    write(root, "broken.pdf", b"not really a pdf");
    write(root, "broken.docx", b"not really a zip");

    let mut config = corpus_config(root);
    config.max_file_bytes = 1024;
    let docs = scan_corpus(&config).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["ok.md"]);
}

#[cfg(unix)]
#[test]
fn dangling_symlinks_do_not_abort_the_scan() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "good.md", FOX.as_bytes());
    std::os::unix::fs::symlink(root.join("missing.md"), root.join("dangling.md")).unwrap();

    let mut config = corpus_config(root);
    config.follow_symlinks = true;
    let docs = scan_corpus(&config).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["good.md"]);

    let corpus = FsCorpus::new(config);
    assert_eq!(corpus.static_sources().unwrap().len(), 1);
}

#[test]
fn docx_documents_are_extracted() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "report.docx", &minimal_docx_with_text(FOX));

    let docs = scan_corpus(&corpus_config(root)).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "report.docx");
    assert_eq!(docs[0].content, FOX);
}

#[test]
fn missing_root_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let config = corpus_config(&tmp.path().join("does-not-exist"));
    let err = scan_corpus(&config).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn detector_over_fs_corpus_reloads_on_demand() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "fox.md", FOX.as_bytes());

    let provider = Arc::new(FsCorpus::new(corpus_config(root)));
    assert!(provider.name().starts_with("filesystem:"));
    let detector = Detector::new(provider, DetectParams::default());

    let input = "Yesterday, the quick brown fox jumps over the lazy dog every single morning without fail.";
    let first = detector.detect_matches(input, Vec::new()).unwrap();
    assert_eq!(first.matches.len(), 1);
    assert_eq!(first.matches[0].source_id, "fox.md");

    // New files are invisible until the index is rebuilt.
    write(root, "copy.txt", FOX.as_bytes());
    let cached = detector.detect_matches(input, Vec::new()).unwrap();
    assert_eq!(cached.summary.len(), 1);

    let rebuilt = detector.corpus().rebuild().unwrap();
    assert_eq!(rebuilt.source_count(), 2);
    assert_eq!(rebuilt.generation, 2);
    let fresh = detector.detect_matches(input, Vec::new()).unwrap();
    assert_eq!(fresh.summary.len(), 2);
}
