// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token grammar.
//!
//! A token is 6–32 hex digits, case-insensitive and stored lowercase. It may
//! carry a plural variant suffix `{name}` where `name` is 1–16 characters of
//! `[a-z0-9_-]`. The composite key `base` or `base{variant}` is what the
//! catalog is indexed by.
//!
//! The inline-reference and placeholder scanners live here as well so the
//! resolver and the validator agree on exactly one grammar.

use std::fmt;

pub const MIN_TOKEN_LEN: usize = 6;
pub const MAX_TOKEN_LEN: usize = 32;
pub const MAX_VARIANT_LEN: usize = 16;

/// `true` iff `s` is 6–32 ASCII hex digits.
pub fn is_hex_token(s: &str) -> bool {
    (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `true` iff `variant` is 1–16 characters from `[a-z0-9_-]`.
///
/// Callers lowercase before validating; uppercase letters are rejected here.
pub fn is_valid_variant(variant: &str) -> bool {
    !variant.is_empty()
        && variant.len() <= MAX_VARIANT_LEN
        && variant
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Split `base{variant}` into its lowercased parts.
///
/// Succeeds only when `{` is present, the first `}` after it is the final
/// character, the base is non-empty and the variant passes the charset rule.
/// The base is not checked for hex syntax.
pub fn parse_variant_suffix(key: &str) -> Option<(String, String)> {
    let open = key.find('{')?;
    let close = key[open + 1..].find('}')? + open + 1;
    if close != key.len() - 1 {
        return None;
    }

    let base = key[..open].to_ascii_lowercase();
    let variant = key[open + 1..close].to_ascii_lowercase();
    if base.is_empty() || !is_valid_variant(&variant) {
        return None;
    }
    Some((base, variant))
}

/// Join a base and an optional variant into a composite key.
pub fn compose_key(base: &str, variant: Option<&str>) -> String {
    match variant {
        Some(v) if !v.is_empty() => format!("{}{{{}}}", base, v),
        _ => base.to_string(),
    }
}

/// A validated, normalized composite key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenKey {
    pub base: String,
    pub variant: Option<String>,
}

impl TokenKey {
    /// Parse and normalize a composite key, rejecting anything that is not a
    /// hex token with an optional valid variant.
    pub fn parse(raw: &str) -> Option<Self> {
        let (base, variant) = if raw.contains('{') {
            let (base, variant) = parse_variant_suffix(raw)?;
            (base, Some(variant))
        } else {
            (raw.to_ascii_lowercase(), None)
        };

        if !is_hex_token(&base) {
            return None;
        }
        Some(Self { base, variant })
    }

    /// Split an already-normalized catalog key without re-validating the base.
    pub fn split(key: &str) -> Self {
        match parse_variant_suffix(key) {
            Some((base, variant)) => Self {
                base,
                variant: Some(variant),
            },
            None => Self {
                base: key.to_string(),
                variant: None,
            },
        }
    }

    pub fn composite(&self) -> String {
        compose_key(&self.base, self.variant.as_deref())
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{}{{{}}}", self.base, v),
            None => f.write_str(&self.base),
        }
    }
}

/// What an `@` at some position of an entry text turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtScan {
    /// `@@`: a literal `@`, two bytes consumed.
    Escaped,
    /// A well-formed inline reference; `len` bytes consumed including the `@`.
    Reference { key: String, len: usize },
    /// A lone `@` that forms no reference; one byte consumed.
    Literal,
}

impl AtScan {
    pub fn advance(&self) -> usize {
        match self {
            AtScan::Escaped => 2,
            AtScan::Reference { len, .. } => *len,
            AtScan::Literal => 1,
        }
    }
}

/// Classify the `@` at byte offset `at` of `text`.
pub fn scan_at(text: &str, at: usize) -> AtScan {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(at), Some(&b'@'));

    if bytes.get(at + 1) == Some(&b'@') {
        return AtScan::Escaped;
    }

    let start = at + 1;
    let hex_len = bytes[start..]
        .iter()
        .take(MAX_TOKEN_LEN)
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if hex_len < MIN_TOKEN_LEN {
        return AtScan::Literal;
    }

    let base = text[start..start + hex_len].to_ascii_lowercase();
    let after = start + hex_len;
    if bytes.get(after) != Some(&b'{') {
        return AtScan::Reference {
            key: base,
            len: 1 + hex_len,
        };
    }

    // The suffix must close within MAX_VARIANT_LEN characters.
    let body = &bytes[after + 1..];
    let close = match body
        .iter()
        .take(MAX_VARIANT_LEN + 1)
        .position(|&b| b == b'}')
    {
        Some(pos) => pos,
        None => return AtScan::Literal,
    };
    let variant = match std::str::from_utf8(&body[..close]) {
        Ok(v) => v.to_ascii_lowercase(),
        Err(_) => return AtScan::Literal,
    };
    if !is_valid_variant(&variant) {
        return AtScan::Literal;
    }

    AtScan::Reference {
        key: compose_key(&base, Some(&variant)),
        len: 1 + hex_len + 1 + close + 1,
    }
}

/// Every distinct inline reference in `text`, sorted.
pub fn inline_refs(text: &str) -> Vec<String> {
    let mut refs = Vec::new();
    let mut i = 0;
    while let Some(off) = text[i..].find('@') {
        let at = i + off;
        let scan = scan_at(text, at);
        i = at + scan.advance();
        if let AtScan::Reference { key, .. } = scan {
            refs.push(key);
        }
    }
    refs.sort();
    refs.dedup();
    refs
}

/// A `%N` placeholder found at some offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The digits as written.
    pub digits: &'a str,
    /// Parsed index; `None` when the digits overflow `usize`.
    pub index: Option<usize>,
    /// Bytes consumed including the `%`.
    pub len: usize,
}

/// Recognize a placeholder at the `%` at byte offset `at`.
pub fn scan_placeholder(text: &str, at: usize) -> Option<Placeholder<'_>> {
    let digits_len = text.as_bytes()[at + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return None;
    }
    let digits = &text[at + 1..at + 1 + digits_len];
    Some(Placeholder {
        digits,
        index: digits.parse().ok(),
        len: 1 + digits_len,
    })
}

/// Every distinct placeholder index in `text`, sorted.
///
/// Indices too large for `usize` are clamped to `usize::MAX`.
pub fn placeholder_indices(text: &str) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut i = 0;
    while let Some(off) = text[i..].find('%') {
        let at = i + off;
        match scan_placeholder(text, at) {
            Some(p) => {
                indices.push(p.index.unwrap_or(usize::MAX));
                i = at + p.len;
            }
            None => i = at + 1,
        }
    }
    indices.sort_unstable();
    indices.dedup();
    indices
}
