//! Web source gathering over HTTP.
//!
//! [`HttpWebGatherer`] turns the input text into a few quoted phrase
//! queries, runs them against an HTML search endpoint, fetches the top
//! result pages and strips their markup into [`SourceDocument`]s.
//!
//! # Retry Strategy
//!
//! Search and page requests share one policy:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (other) → fail immediately
//! - Network errors → retry
//!
//! Backoff is exponential: 1s, 2s, 4s, … up to `web.max_retries` retries.
//!
//! Every failure is logged and skipped, so [`WebGatherer::gather`] always
//! returns a (possibly empty) list.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};
use sourcecheck_core::{GatherOptions, SourceDocument, WebGatherer};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::WebConfig;

/// Sentences shorter than this are too generic to search for.
const MIN_QUERY_WORDS: usize = 8;
/// Words kept per query phrase.
const MAX_QUERY_WORDS: usize = 12;

/// Tags whose content never reaches the extracted text.
const SKIP_CHILDREN: &[&str] = &["script", "style", "noscript", "svg", "head", "template"];

/// Tags rendered as line breaks.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

const FALLBACK_RESULT_SELECTOR: &str = r#"a[href^="http"]"#;

/// Gathers reference pages from the web through an HTML search endpoint.
pub struct HttpWebGatherer {
    client: reqwest::Client,
    config: WebConfig,
    result_selector: Selector,
    fallback_selector: Selector,
}

impl HttpWebGatherer {
    pub fn new(config: WebConfig) -> Result<Self> {
        let result_selector = parse_selector(&config.result_selector)?;
        let fallback_selector = parse_selector(FALLBACK_RESULT_SELECTOR)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            config,
            result_selector,
            fallback_selector,
        })
    }

    /// Run one search query and return up to `limit` result URLs.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let search_url = self.config.search_url.replace("{query}", &encoded);
        let base = Url::parse(&search_url)?;

        let response = self.get_with_retry(&search_url).await?;
        let body = read_body(response, self.config.max_page_bytes).await?;
        let html = String::from_utf8_lossy(&body);

        let links = extract_result_links(
            &html,
            &base,
            &self.result_selector,
            &self.fallback_selector,
            limit,
        );
        debug!(query, results = links.len(), "search complete");
        Ok(links)
    }

    /// Fetch one page and convert it into a document. `Ok(None)` for
    /// non-text responses and pages without visible text.
    pub async fn fetch_document(&self, page_url: &str) -> Result<Option<SourceDocument>> {
        let response = self.get_with_retry(page_url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let is_html = content_type.contains("html");
        if !is_html && !content_type.starts_with("text/plain") {
            debug!(url = page_url, content_type = %content_type, "skipping non-text page");
            return Ok(None);
        }

        let body = read_body(response, self.config.max_page_bytes).await?;
        let raw = String::from_utf8_lossy(&body);
        let (title, text) = if is_html {
            html_to_text(&raw)
        } else {
            (String::new(), raw.trim().to_string())
        };
        if text.is_empty() {
            return Ok(None);
        }

        let title = if title.is_empty() {
            page_url.to_string()
        } else {
            title
        };
        Ok(Some(SourceDocument::new(
            web_document_id(page_url),
            title,
            page_url,
            text,
        )))
    }

    /// GET with retry/backoff.
    async fn get_with_retry(&self, target: &str) -> Result<reqwest::Response> {
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            match self.client.get(target).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("HTTP {} from {}", status, target));
                        continue;
                    }

                    bail!("HTTP {} from {}", status, target);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("request to {} failed after retries", target)))
    }
}

#[async_trait]
impl WebGatherer for HttpWebGatherer {
    async fn gather(&self, text: &str, options: &GatherOptions) -> Vec<SourceDocument> {
        let options = options.or(self.config.gather_defaults());
        let max_queries = options.max_queries.unwrap_or(self.config.max_queries);
        let per_query = options
            .results_per_query
            .unwrap_or(self.config.results_per_query);

        let queries = derive_queries(text, max_queries);
        if queries.is_empty() {
            debug!("no sentence long enough to search for");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut docs = Vec::new();
        for query in &queries {
            let links = match self.search(query, per_query).await {
                Ok(links) => links,
                Err(e) => {
                    warn!(query = %query, error = %e, "web search failed");
                    continue;
                }
            };
            for link in links {
                if !seen.insert(link.clone()) {
                    continue;
                }
                match self.fetch_document(&link).await {
                    Ok(Some(doc)) => docs.push(doc),
                    Ok(None) => {}
                    Err(e) => warn!(url = %link, error = %e, "page fetch failed"),
                }
            }
        }

        info!(
            queries = queries.len(),
            pages = seen.len(),
            documents = docs.len(),
            "web gather complete"
        );
        docs
    }
}

/// Pick the longest sentences of `text` as quoted phrase queries.
pub fn derive_queries(text: &str, max_queries: usize) -> Vec<String> {
    let mut sentences: Vec<Vec<String>> = text
        .split(['.', '!', '?', '\n'])
        .map(|s| {
            s.split_whitespace()
                .map(|w| w.replace('"', ""))
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|words| words.len() >= MIN_QUERY_WORDS)
        .collect();
    sentences.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut seen = HashSet::new();
    let mut queries = Vec::new();
    for words in sentences {
        if queries.len() >= max_queries {
            break;
        }
        let phrase = words[..words.len().min(MAX_QUERY_WORDS)].join(" ");
        if seen.insert(phrase.to_lowercase()) {
            queries.push(format!("\"{}\"", phrase));
        }
    }
    queries
}

/// Stable document id for a fetched page.
pub fn web_document_id(page_url: &str) -> String {
    let digest = Sha256::digest(page_url.as_bytes());
    format!("web:{}", hex::encode(&digest[..8]))
}

/// Visible text of an HTML page: `(title, text)`.
///
/// Invisible elements are dropped, block elements become line breaks and
/// whitespace is collapsed within each line.
pub fn html_to_text(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    let text = raw
        .lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (title, text)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    let tag = el.value().name();
    if SKIP_CHILDREN.contains(&tag) {
        return;
    }
    let block = BLOCK_TAGS.contains(&tag);
    if block {
        out.push('\n');
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Result links from a search page, resolved against `base`, with
/// DuckDuckGo redirect links unwrapped. Falls back to every absolute
/// link when `primary` matches nothing.
pub fn extract_result_links(
    html: &str,
    base: &Url,
    primary: &Selector,
    fallback: &Selector,
    limit: usize,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let links = collect_links(&document, primary, base, limit);
    if !links.is_empty() {
        return links;
    }
    collect_links(&document, fallback, base, limit)
        .into_iter()
        .filter(|l| !same_host(l, base))
        .collect()
}

fn collect_links(document: &Html, selector: &Selector, base: &Url, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in document.select(selector) {
        if out.len() >= limit {
            break;
        }
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(target) = resolve_result_link(base, href) else {
            continue;
        };
        if seen.insert(target.clone()) {
            out.push(target);
        }
    }
    out
}

fn resolve_result_link(base: &Url, href: &str) -> Option<String> {
    let mut resolved = base.join(href).ok()?;
    if resolved.path().starts_with("/l/") {
        let redirect = resolved
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
        if let Some(target) = redirect {
            resolved = Url::parse(&target).ok()?;
        }
    }
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

fn same_host(link: &str, base: &Url) -> bool {
    Url::parse(link)
        .map(|u| {
            u.host_str() == base.host_str()
                && u.port_or_known_default() == base.port_or_known_default()
        })
        .unwrap_or(false)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid CSS selector {:?}: {:?}", selector, e))
}

async fn read_body(mut response: reqwest::Response, max_bytes: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes.saturating_sub(body.len());
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= max_bytes {
            debug!(max_bytes, "response body truncated");
            break;
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_queries_prefers_long_sentences() {
        let text = "Short one. This sentence has exactly eight words in it! \
                    Here is a considerably longer sentence that runs on for well past twelve words total.\n\
                    tiny";
        let queries = derive_queries(text, 3);
        assert_eq!(queries.len(), 2);
        assert_eq!(
            queries[0],
            "\"Here is a considerably longer sentence that runs on for well past\""
        );
        assert_eq!(queries[1], "\"This sentence has exactly eight words in it\"");
    }

    #[test]
    fn test_derive_queries_dedupes_and_limits() {
        let s = "one two three four five six seven eight nine";
        let text = format!("{s}. {s}. {s} ten. {s} ten eleven.");
        let queries = derive_queries(&text, 2);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("eleven"));
        assert!(queries[1].ends_with("ten\""));
        assert!(derive_queries("too short to search", 3).is_empty());
        assert!(derive_queries(&text, 0).is_empty());
    }

    #[test]
    fn test_html_to_text_drops_invisible_content() {
        let html = r#"
        <html>
          <head><title> Fox   Facts </title><style>p { color: red }</style></head>
          <body>
            <script>var hidden = 1;</script>
            <h1>Foxes</h1>
            <p>The quick   brown fox
               jumps.</p><p>Second <b>paragraph</b>.</p>
            <noscript>enable js</noscript>
          </body>
        </html>"#;
        let (title, text) = html_to_text(html);
        assert_eq!(title, "Fox Facts");
        assert_eq!(text, "Foxes\nThe quick brown fox\njumps.\nSecond paragraph.");
    }

    #[test]
    fn test_extract_result_links_unwraps_redirects() {
        let html = r#"
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Ffox&rut=abc">Fox</a>
            <a class="result__a" href="https://example.org/dog#top">Dog</a>
            <a class="result__a" href="https://example.org/dog">Dog again</a>
            <a class="result__a" href="mailto:someone@example.com">Mail</a>
            <a class="result__a" href="https://example.net/third">Third</a>"#;
        let base = Url::parse("https://html.duckduckgo.com/html/?q=fox").unwrap();
        let primary = parse_selector("a.result__a").unwrap();
        let fallback = parse_selector(FALLBACK_RESULT_SELECTOR).unwrap();
        let links = extract_result_links(html, &base, &primary, &fallback, 2);
        assert_eq!(
            links,
            vec!["https://example.com/fox", "https://example.org/dog"]
        );
    }

    #[test]
    fn test_extract_result_links_fallback() {
        let html = r#"
            <a href="https://search.example/about">About</a>
            <a href="https://pages.example/one">One</a>
            <a href="/relative">Relative</a>"#;
        let base = Url::parse("https://search.example/?q=x").unwrap();
        let primary = parse_selector("a.result__a").unwrap();
        let fallback = parse_selector(FALLBACK_RESULT_SELECTOR).unwrap();
        let links = extract_result_links(html, &base, &primary, &fallback, 5);
        assert_eq!(links, vec!["https://pages.example/one"]);
    }

    #[test]
    fn test_web_document_id() {
        let id = web_document_id("https://example.com/fox");
        assert!(id.starts_with("web:"));
        assert_eq!(id.len(), 4 + 16);
        assert_eq!(id, web_document_id("https://example.com/fox"));
        assert_ne!(id, web_document_id("https://example.com/dog"));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = WebConfig {
            result_selector: "a[".to_string(),
            ..WebConfig::default()
        };
        assert!(HttpWebGatherer::new(config).is_err());
    }
}
