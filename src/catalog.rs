// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog data model.
//!
//! A [`Catalog`] is built once by a parser or decoder through
//! [`CatalogBuilder`] and never mutated afterwards. Keys are kept in
//! ordered maps so every listing (dump, find, check, export) is
//! deterministic without re-sorting.

use crate::error::{CatalogError, Result};
use crate::plural::PluralRule;
use crate::token::{is_hex_token, is_valid_variant, TokenKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Catalog-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub locale: String,
    pub fallback: String,
    pub note: String,
    pub plural: PluralRule,
}

/// One loaded catalog: entries, labels, variant index and metadata.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
    variants: BTreeMap<String, BTreeSet<String>>,
    metadata: Metadata,
}

impl Catalog {
    /// Raw text stored under a composite key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Variant names registered for `base`, in lexicographic order.
    pub fn variants_of(&self, base: &str) -> impl Iterator<Item = &str> {
        self.variants
            .get(base)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.metadata.plural
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates entries for a catalog under construction.
///
/// Rejects duplicate keys on insert; [`CatalogBuilder::finish`] rejects an
/// empty result.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.catalog.metadata
    }

    /// Insert an entry. `line` is only used to annotate errors.
    ///
    /// The key must already be normalized: a lowercase hex base and, if
    /// present, a valid variant.
    pub fn insert(
        &mut self,
        key: TokenKey,
        text: String,
        label: Option<String>,
        line: Option<usize>,
    ) -> Result<()> {
        let base_ok =
            is_hex_token(&key.base) && !key.base.bytes().any(|b| b.is_ascii_uppercase());
        let variant_ok = key.variant.as_deref().map_or(true, is_valid_variant);
        if !base_ok || !variant_ok {
            let message = format!("invalid token key '{}'", key);
            return Err(match line {
                Some(line) => CatalogError::format_at(line, message),
                None => CatalogError::format(message),
            });
        }

        let composite = key.composite();
        if self.catalog.entries.contains_key(&composite) {
            return Err(CatalogError::DuplicateKey {
                key: composite,
                line,
            });
        }

        if let Some(variant) = key.variant {
            self.catalog
                .variants
                .entry(key.base)
                .or_default()
                .insert(variant);
        }
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            self.catalog.labels.insert(composite.clone(), label);
        }
        self.catalog.entries.insert(composite, text);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.catalog.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.entries.is_empty()
    }

    /// Seal the catalog. Fails when nothing was inserted.
    pub fn finish(self) -> Result<Catalog> {
        if self.catalog.is_empty() {
            return Err(CatalogError::format("no valid entries loaded (empty catalog?)"));
        }
        Ok(self.catalog)
    }
}
