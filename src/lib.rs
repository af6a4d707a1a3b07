//! # SourceCheck
//!
//! Lexical overlap detection between a document and a set of reference
//! sources.
//!
//! The detection engine lives in the `sourcecheck-core` crate. This crate
//! adds the parts that touch the outside world: a filesystem corpus, PDF
//! and DOCX extraction, web source gathering, the `srccheck` CLI and an
//! HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  FsCorpus   │──▶│ CorpusIndex  │──▶│                │
//! │ md/txt/pdf  │   │  (memoized)  │   │    Detector    │──▶ DetectionResult
//! └─────────────┘   └──────────────┘   │                │
//! ┌─────────────┐   ┌──────────────┐   │                │
//! │ Web search  │──▶│ ad-hoc index │──▶│                │
//! └─────────────┘   └──────────────┘   └────────────────┘
//!                                              ▲
//!                              ┌───────────────┴──┐
//!                         ┌──────────┐       ┌──────────┐
//!                         │   CLI    │       │   HTTP   │
//!                         │(srccheck)│       │  (axum)  │
//!                         └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus_fs`] | Filesystem corpus provider |
//! | [`extract`] | PDF and DOCX text extraction |
//! | [`web`] | Web search, fetch, and markup stripping |
//! | [`check`] | Check orchestration and CLI reports |
//! | [`server`] | HTTP API server |

pub mod check;
pub mod config;
pub mod corpus_fs;
pub mod extract;
pub mod server;
pub mod web;
