//! Word shingles and their content fingerprints.
//!
//! A shingle is a window of `K` consecutive tokens (sliding by one). Each
//! token is canonicalized (lowercased, everything outside `[a-z0-9]`
//! removed), the window is joined with single spaces, and the result is
//! hashed with SHA-256. The hash is a content fingerprint only; nothing
//! relies on it being secret or unforgeable.
//!
//! # Example
//!
//! ```rust
//! use sourcecheck_core::shingle::build_shingles;
//! use sourcecheck_core::tokenize::tokenize;
//!
//! let text = "One two three four five six seven";
//! let shingles = build_shingles(&tokenize(text));
//! assert_eq!(shingles.len(), 2);
//! assert_eq!(&text[shingles[1].start..shingles[1].end], "two three four five six seven");
//! ```

use sha2::{Digest, Sha256};

use crate::models::{Fingerprint, Shingle, Token};
use crate::params::SHINGLE_SIZE;

/// Build shingles with the default window size ([`SHINGLE_SIZE`]).
pub fn build_shingles(tokens: &[Token<'_>]) -> Vec<Shingle> {
    build_shingles_with(tokens, SHINGLE_SIZE)
}

/// Build shingles over windows of `k` tokens.
///
/// Fewer than `k` tokens (or `k == 0`) produce no shingles. Windows whose
/// canonical form has no alphanumeric content are dropped.
pub fn build_shingles_with(tokens: &[Token<'_>], k: usize) -> Vec<Shingle> {
    if k == 0 || tokens.len() < k {
        return Vec::new();
    }

    let canonical: Vec<String> = tokens.iter().map(|t| canonicalize(t.value)).collect();

    let mut shingles = Vec::with_capacity(tokens.len() - k + 1);
    for i in 0..=(tokens.len() - k) {
        let window = &canonical[i..i + k];
        if window.iter().all(|c| c.is_empty()) {
            continue;
        }
        shingles.push(Shingle {
            hash: fingerprint(&window.join(" ")),
            start: tokens[i].start,
            end: tokens[i + k - 1].end,
        });
    }
    shingles
}

/// Lowercase a token and strip everything except ASCII `[a-z0-9]`.
pub fn canonicalize(token: &str) -> String {
    token
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// SHA-256 fingerprint of a canonical shingle string.
pub fn fingerprint(canonical: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Fingerprint(out)
}
