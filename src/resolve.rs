// SPDX-License-Identifier: PMPL-1.0-or-later

//! Template resolution.
//!
//! Expands a token's stored text against one catalog: inline `@token`
//! references, `%N` positional arguments and plural variant selection.
//! Resolution never fails. Problems surface in-band as `⟦...⟧` markers so a
//! broken catalog degrades visibly instead of crashing the host.

use crate::catalog::Catalog;
use crate::token::{self, AtScan};

/// Maximum expansion depth before a branch is cut off.
pub const MAX_DEPTH: usize = 32;

pub const RECURSION_LIMIT_MARKER: &str = "⟦RECURSION_LIMIT⟧";

/// Resolves tokens against a borrowed catalog.
///
/// The resolver is stateless between calls; each call starts with an empty
/// ancestor stack at depth 0.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve `token` with positional `args`.
    pub fn translate<S: AsRef<str>>(&self, token: &str, args: &[S]) -> String {
        let key = token.to_ascii_lowercase();
        let mut ancestors = Vec::new();
        self.expand(&key, args, &mut ancestors, 0)
    }

    /// Resolve `token` choosing the plural variant for `count`.
    ///
    /// An explicit `{variant}` on `token` wins and `count` is ignored.
    pub fn translate_plural<S: AsRef<str>>(&self, token: &str, count: i64, args: &[S]) -> String {
        let key = self.plural_key(token, count);
        let mut ancestors = Vec::new();
        self.expand(&key, args, &mut ancestors, 0)
    }

    /// Composite key `translate_plural` would expand for `token` and `count`.
    pub fn plural_key(&self, token: &str, count: i64) -> String {
        let normalized = token.to_ascii_lowercase();
        if let Some((base, variant)) = token::parse_variant_suffix(&normalized) {
            return token::compose_key(&base, Some(&variant));
        }

        let base = normalized;
        let desired = self.catalog.plural_rule().variant_for(count);
        let candidates = [
            Some(token::compose_key(&base, Some(desired))),
            Some(token::compose_key(&base, Some("other"))),
            self.catalog
                .variants_of(&base)
                .next()
                .map(|v| token::compose_key(&base, Some(v))),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|key| self.catalog.contains(key))
            .unwrap_or(base)
    }

    fn expand<S: AsRef<str>>(
        &self,
        key: &str,
        args: &[S],
        ancestors: &mut Vec<String>,
        depth: usize,
    ) -> String {
        if depth > MAX_DEPTH {
            return RECURSION_LIMIT_MARKER.to_string();
        }
        if ancestors.iter().any(|a| a == key) {
            return format!("⟦CYCLE:{}⟧", key);
        }
        let raw = match self.catalog.get(key) {
            Some(raw) => raw,
            None => return format!("⟦{}⟧", key),
        };

        ancestors.push(key.to_string());
        let out = self.render(raw, args, ancestors, depth);
        ancestors.pop();
        out
    }

    fn render<S: AsRef<str>>(
        &self,
        raw: &str,
        args: &[S],
        ancestors: &mut Vec<String>,
        depth: usize,
    ) -> String {
        let mut out = String::with_capacity(raw.len() + 32);
        let mut i = 0;

        while let Some(off) = raw[i..].find(['@', '%']) {
            let at = i + off;
            out.push_str(&raw[i..at]);

            if raw.as_bytes()[at] == b'@' {
                let scan = token::scan_at(raw, at);
                match &scan {
                    AtScan::Escaped | AtScan::Literal => out.push('@'),
                    AtScan::Reference { key, .. } => {
                        if self.catalog.contains(key) {
                            let nested: [&str; 0] = [];
                            out.push_str(&self.expand(key, &nested, ancestors, depth + 1));
                        } else {
                            out.push_str(&format!("⟦MISSING:@{}⟧", key));
                        }
                    }
                }
                i = at + scan.advance();
                continue;
            }

            match token::scan_placeholder(raw, at) {
                Some(placeholder) => {
                    match placeholder.index.and_then(|idx| args.get(idx)) {
                        Some(arg) => out.push_str(&self.resolve_arg(arg.as_ref(), ancestors, depth)),
                        None => {
                            let shown = placeholder
                                .index
                                .map_or_else(|| placeholder.digits.to_string(), |idx| idx.to_string());
                            out.push_str(&format!("⟦arg:{}⟧", shown));
                        }
                    }
                    i = at + placeholder.len;
                }
                None => {
                    out.push('%');
                    i = at + 1;
                }
            }
        }

        out.push_str(&raw[i..]);
        out
    }

    /// `=`-prefixed arguments are literal. Otherwise an argument naming a
    /// present token is expanded; anything else passes through verbatim.
    fn resolve_arg(&self, arg: &str, ancestors: &mut Vec<String>, depth: usize) -> String {
        if let Some(literal) = arg.strip_prefix('=') {
            return literal.to_string();
        }

        let normalized = arg.to_ascii_lowercase();
        let (base, lookup) = match token::parse_variant_suffix(&normalized) {
            Some((base, variant)) => {
                let lookup = token::compose_key(&base, Some(&variant));
                (base, lookup)
            }
            None => (normalized.clone(), normalized),
        };

        if !token::is_hex_token(&base) || !self.catalog.contains(&lookup) {
            return arg.to_string();
        }
        let nested: [&str; 0] = [];
        self.expand(&lookup, &nested, ancestors, depth + 1)
    }
}
