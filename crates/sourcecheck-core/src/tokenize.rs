//! Whitespace tokenizer with original byte offsets.
//!
//! No normalization happens here; canonicalization is deferred to shingle
//! construction so that matched text and snippets can be cut from the
//! original casing and punctuation.

use crate::models::Token;

/// Split `text` on runs of whitespace.
///
/// Every non-whitespace run becomes one [`Token`] borrowing from `text`.
/// Empty or all-whitespace input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    value: &text[s..i],
                    start: s,
                    end: i,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        tokens.push(Token {
            value: &text[s..],
            start: s,
            end: text.len(),
        });
    }

    tokens
}
