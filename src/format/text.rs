// SPDX-License-Identifier: PMPL-1.0-or-later

//! Line-oriented text catalog parser.
//!
//! ```text
//! # comment
//! @meta locale = de_DE
//! @meta plural = slavic
//! a1b2c3(greeting): Hallo %0
//! dddddd{one}: ein Eintrag
//! ```
//!
//! Strict mode turns every tolerated irregularity into an error carrying the
//! line number. Duplicate keys and an empty result fail in either mode.

use crate::catalog::{Catalog, CatalogBuilder, Metadata};
use crate::error::{CatalogError, Result};
use crate::plural::PluralRule;
use crate::token::TokenKey;
use tracing::warn;

const BOM: char = '\u{feff}';

/// One parsed `HEAD : TEXT` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLine {
    pub key: TokenKey,
    pub label: Option<String>,
    pub text: String,
}

/// Parse a whole text catalog.
pub fn parse(src: &str, strict: bool) -> Result<Catalog> {
    let src = src.strip_prefix(BOM).unwrap_or(src);
    let mut builder = CatalogBuilder::new();
    let mut seen_entry = false;

    for (idx, line) in src.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = parse_meta_line(raw) {
            if seen_entry {
                if strict {
                    return Err(CatalogError::format_at(line_no, "meta line after entries"));
                }
                warn!(line = line_no, "ignoring meta line after entries");
                continue;
            }
            apply_meta(builder.metadata_mut(), &key, &value, strict, line_no)?;
            continue;
        }

        match parse_entry_line(raw) {
            Ok(entry) => {
                builder.insert(entry.key, entry.text, entry.label, Some(line_no))?;
                seen_entry = true;
            }
            Err(message) => {
                if strict {
                    return Err(CatalogError::format_at(line_no, message));
                }
                warn!(line = line_no, reason = %message, "skipping malformed line");
            }
        }
    }

    builder.finish()
}

fn apply_meta(meta: &mut Metadata, key: &str, value: &str, strict: bool, line_no: usize) -> Result<()> {
    match key {
        "locale" => meta.locale = value.to_string(),
        "fallback" => meta.fallback = value.to_string(),
        "note" => meta.note = value.to_string(),
        "plural" => match value.parse::<PluralRule>() {
            Ok(rule) => meta.plural = rule,
            Err(message) if strict => return Err(CatalogError::format_at(line_no, message)),
            Err(message) => warn!(line = line_no, reason = %message, "ignoring plural meta"),
        },
        _ if strict => {
            return Err(CatalogError::format_at(
                line_no,
                format!("unknown meta key '{}'", key),
            ))
        }
        _ => warn!(line = line_no, key, "ignoring unknown meta key"),
    }
    Ok(())
}

/// Recognize `@meta key = value` with a non-empty key and value.
///
/// The key comes back lowercased, both sides trimmed.
pub fn parse_meta_line(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix("@meta")?;
    let (key, value) = rest.split_once('=')?;
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value.to_string()))
}

/// Parse one entry line. The error string describes why the line is invalid.
pub fn parse_entry_line(line: &str) -> std::result::Result<EntryLine, String> {
    let line = line.trim();
    let (head, text) = line
        .split_once(':')
        .ok_or_else(|| "no ':' found".to_string())?;
    let head = head.trim();

    let (token, label) = match head.find('(') {
        None => (head, None),
        Some(open) => {
            let close = head[open + 1..]
                .find(')')
                .ok_or_else(|| "label '(' without closing ')'".to_string())?
                + open
                + 1;
            (head[..open].trim(), Some(head[open + 1..close].trim().to_string()))
        }
    };

    let key = if token.contains('{') {
        TokenKey::parse(token).ok_or_else(|| format!("invalid token variant '{}'", token))?
    } else {
        TokenKey::parse(token)
            .ok_or_else(|| format!("token '{}' is not a hex string (6-32 characters)", token))?
    };

    Ok(EntryLine {
        key,
        label,
        text: unescape(text.trim_start()),
    })
}

/// Resolve `\n \t \r \\ \:`; any other `\X` keeps `X`. A trailing lone
/// backslash is kept.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_and_entries() {
        let src = "\u{feff}# header\r\n@meta locale = en\r\n@meta Note = hello world\n@meta plural = Slavic\n\ndeadbe(title): Hello %0\n";
        let catalog = parse(src, true).unwrap();
        let meta = catalog.metadata();
        assert_eq!(meta.locale, "en");
        assert_eq!(meta.note, "hello world");
        assert_eq!(meta.plural, PluralRule::Slavic);
        assert_eq!(catalog.get("deadbe"), Some("Hello %0"));
        assert_eq!(catalog.label("deadbe"), Some("title"));
    }

    #[test]
    fn meta_key_is_case_folded_but_value_kept() {
        assert_eq!(
            parse_meta_line("@meta  LOCALE =  de_DE "),
            Some(("locale".to_string(), "de_DE".to_string()))
        );
        assert_eq!(parse_meta_line("@meta locale ="), None);
        assert_eq!(parse_meta_line("@meta locale"), None);
    }

    #[test]
    fn unknown_meta_key_is_strict_only() {
        let src = "@meta colour = blue\naaaaaa: x\n";
        let err = parse(src, true).unwrap_err();
        assert!(matches!(err, CatalogError::Format { line: Some(1), .. }));
        assert_eq!(parse(src, false).unwrap().len(), 1);
    }

    #[test]
    fn unknown_plural_value_is_strict_only() {
        let src = "@meta plural = celtic\naaaaaa: x\n";
        assert!(parse(src, true).is_err());
        let catalog = parse(src, false).unwrap();
        assert_eq!(catalog.plural_rule(), PluralRule::Default);
    }

    #[test]
    fn meta_after_entry() {
        let src = "aaaaaa: x\n@meta locale = fr\n";
        let err = parse(src, true).unwrap_err();
        assert!(matches!(err, CatalogError::Format { line: Some(2), .. }));
        let catalog = parse(src, false).unwrap();
        assert_eq!(catalog.metadata().locale, "");
    }

    #[test]
    fn meta_phase_survives_skipped_lines() {
        let src = "garbage line\n@meta locale = fr\naaaaaa: x\n";
        let catalog = parse(src, false).unwrap();
        assert_eq!(catalog.metadata().locale, "fr");
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(parse_entry_line("aaaaaa text"), Err("no ':' found".to_string()));
        assert!(parse_entry_line("aaaaaa(label: text").is_err());
        assert!(parse_entry_line("xyz: text").is_err());
        assert!(parse_entry_line("aaaaaa{Bad Variant}: text").is_err());

        let src = "aaaaaa: ok\nnot a token: skipped\n";
        let err = parse(src, true).unwrap_err();
        assert!(matches!(err, CatalogError::Format { line: Some(2), .. }));
        assert_eq!(parse(src, false).unwrap().len(), 1);
    }

    #[test]
    fn entry_line_shapes() {
        let entry = parse_entry_line("  ABCDEF{Few} ( Some label )  :   text: with colon").unwrap();
        assert_eq!(entry.key.to_string(), "abcdef{few}");
        assert_eq!(entry.label.as_deref(), Some("Some label"));
        assert_eq!(entry.text, "text: with colon");
    }

    #[test]
    fn duplicates_fail_even_when_lenient() {
        let src = "aaaaaa: one\nAAAAAA: two\n";
        let err = parse(src, false).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { line: Some(2), .. }));
    }

    #[test]
    fn empty_catalog_fails() {
        assert!(parse("# nothing\n\n", false).is_err());
        assert!(parse("only garbage\n", false).is_err());
        assert!(parse("", false).is_err());
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r"a\nb\tc\rd\\e\:f\qg"), "a\nb\tc\rd\\e:fqg");
        assert_eq!(unescape(r"trailing\"), "trailing\\");
        let catalog = parse(r"aaaaaa: line1\nline2 \: done", true).unwrap();
        assert_eq!(catalog.get("aaaaaa"), Some("line1\nline2 : done"));
    }
}
