// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog source formats
//!
//! Both parsers produce a complete [`Catalog`] or an error. Nothing here
//! touches engine state.

pub mod binary;
pub mod text;

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};

pub use binary::looks_like_binary;

/// Source format of a byte blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Text,
    Binary,
}

impl SourceFormat {
    pub fn detect(data: &[u8]) -> Self {
        if looks_like_binary(data) {
            SourceFormat::Binary
        } else {
            SourceFormat::Text
        }
    }
}

/// Decode file bytes as UTF-8 text, dropping a BOM.
///
/// Malformed sequences fail in strict mode and are replaced otherwise.
pub fn decode_text(data: &[u8], strict: bool) -> Result<String> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(data);
    if had_errors {
        if strict {
            return Err(CatalogError::format("source is not valid UTF-8"));
        }
        tracing::warn!("source contains invalid UTF-8, replaced lossily");
    }
    Ok(text.into_owned())
}

/// Parse raw bytes in whichever format they carry.
pub fn parse_bytes(data: &[u8], strict: bool) -> Result<Catalog> {
    match SourceFormat::detect(data) {
        SourceFormat::Binary => binary::decode(data, strict),
        SourceFormat::Text => text::parse(&decode_text(data, strict)?, strict),
    }
}
