// SPDX-License-Identifier: PMPL-1.0-or-later

//! Versioned binary catalog codec.
//!
//! Layout (all integers little-endian):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `I18N` |
//! | 4 | 1 | version (1 legacy, 2 current) |
//! | 5 | 1 | flags (unused) |
//! | 6 | 1 | v2: plural rule id |
//! | 7 | 1 | v2: reserved |
//! | 8 | 4 | entry count |
//! | 12 | 4 | string table size |
//! | 16 | 4 | FNV-1a checksum |
//! | 20 | 4 | v2: metadata block size |
//!
//! Then, for v2, the optional metadata block, the entry table and the string
//! table. Decoding either yields a complete catalog or an error; nothing is
//! half-built.

use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::{CatalogError, Result};
use crate::plural::PluralRule;
use crate::token::{is_hex_token, is_valid_variant, TokenKey, MAX_TOKEN_LEN, MIN_TOKEN_LEN};
use std::borrow::Cow;
use tracing::warn;

pub const MAGIC: [u8; 4] = *b"I18N";
pub const VERSION_V1: u8 = 1;
pub const VERSION_V2: u8 = 2;
pub const VERSION_CURRENT: u8 = VERSION_V2;
pub const HEADER_SIZE_V1: usize = 20;
pub const HEADER_SIZE_V2: usize = 24;
pub const METADATA_HEADER_SIZE: usize = 6;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Incremental 32-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32(u32);

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self(FNV_OFFSET_BASIS)
    }
}

impl Fnv1a32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        for &b in data {
            self.0 ^= u32::from(b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
        self
    }

    pub fn finish(&self) -> u32 {
        self.0
    }
}

/// One-shot FNV-1a over `data`.
pub fn fnv1a32(data: &[u8]) -> u32 {
    Fnv1a32::new().update(data).finish()
}

/// `true` when `data` carries a supported binary header.
pub fn looks_like_binary(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE_V1
        && data[..4] == MAGIC
        && matches!(data[4], VERSION_V1 | VERSION_V2)
}

#[derive(Debug, Clone, Copy)]
struct Header {
    version: u8,
    plural_id: u8,
    entry_count: u32,
    string_table_size: u32,
    checksum: u32,
    metadata_size: u32,
}

impl Header {
    fn size(&self) -> usize {
        if self.version == VERSION_V1 {
            HEADER_SIZE_V1
        } else {
            HEADER_SIZE_V2
        }
    }
}

struct RawEntry {
    key: TokenKey,
    text_offset: u32,
    text_length: u32,
}

/// Bounds-checked little-endian reader over the input buffer.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CatalogError::integrity(format!("{} exceeds data", what)))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn read_u32_at(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn parse_header(data: &[u8]) -> Result<Header> {
    if data.len() < MAGIC.len() || data[..4] != MAGIC {
        return Err(CatalogError::format("unknown binary format (bad magic)"));
    }
    let version = match data.get(4).copied() {
        Some(v) if v == VERSION_V1 || v == VERSION_V2 => v,
        Some(v) => {
            return Err(CatalogError::format(format!(
                "unsupported binary format version {}",
                v
            )))
        }
        None => return Err(CatalogError::integrity("header too short")),
    };
    let header_size = if version == VERSION_V1 {
        HEADER_SIZE_V1
    } else {
        HEADER_SIZE_V2
    };
    if data.len() < header_size {
        return Err(CatalogError::integrity("header too short"));
    }

    Ok(Header {
        version,
        plural_id: if version == VERSION_V1 { 0 } else { data[6] },
        entry_count: read_u32_at(data, 8),
        string_table_size: read_u32_at(data, 12),
        checksum: read_u32_at(data, 16),
        metadata_size: if version == VERSION_V1 {
            0
        } else {
            read_u32_at(data, 20)
        },
    })
}

fn utf8_field<'a>(bytes: &'a [u8], what: &str, strict: bool) -> Result<Cow<'a, str>> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(Cow::Borrowed(s)),
        Err(_) if strict => Err(CatalogError::format(format!("{} is not valid UTF-8", what))),
        Err(_) => Ok(String::from_utf8_lossy(bytes)),
    }
}

/// Split the metadata block into its locale, fallback and note runs.
fn split_metadata(block: &[u8]) -> Result<[&[u8]; 3]> {
    if block.len() < METADATA_HEADER_SIZE {
        return Err(CatalogError::integrity("metadata block too short"));
    }
    let mut reader = Reader::new(block, 0);
    let locale_len = usize::from(reader.u16("metadata")?);
    let fallback_len = usize::from(reader.u16("metadata")?);
    let note_len = usize::from(reader.u16("metadata")?);
    if METADATA_HEADER_SIZE + locale_len + fallback_len + note_len != block.len() {
        return Err(CatalogError::integrity("metadata length inconsistent"));
    }
    Ok([
        reader.take(locale_len, "locale")?,
        reader.take(fallback_len, "fallback")?,
        reader.take(note_len, "note")?,
    ])
}

fn parse_entry(reader: &mut Reader<'_>) -> Result<RawEntry> {
    let base_len = usize::from(reader.u8("entry table")?);
    if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&base_len) {
        return Err(CatalogError::integrity(format!("invalid token length {}", base_len)));
    }
    let base = reader.take(base_len, "token")?.to_ascii_lowercase();
    let base = String::from_utf8(base)
        .ok()
        .filter(|b| is_hex_token(b))
        .ok_or_else(|| CatalogError::format("token is not a hex string"))?;

    let variant_len = usize::from(reader.u8("entry table")?);
    let variant = if variant_len == 0 {
        None
    } else {
        let raw = reader.take(variant_len, "variant")?.to_ascii_lowercase();
        let variant = String::from_utf8(raw)
            .ok()
            .filter(|v| is_valid_variant(v))
            .ok_or_else(|| CatalogError::format("variant contains invalid characters"))?;
        Some(variant)
    };

    let text_offset = reader.u32("entry")?;
    let text_length = reader.u32("entry")?;
    Ok(RawEntry {
        key: TokenKey { base, variant },
        text_offset,
        text_length,
    })
}

/// Decode a v1 or v2 binary catalog.
///
/// A checksum mismatch fails in strict mode and is logged otherwise. An
/// unknown plural rule id is logged and replaced by the default rule.
pub fn decode(data: &[u8], strict: bool) -> Result<Catalog> {
    let header = parse_header(data)?;
    let header_size = header.size();

    let metadata_size = header.metadata_size as usize;
    if metadata_size > data.len() - header_size {
        return Err(CatalogError::integrity("metadata block too large"));
    }
    let metadata_block = &data[header_size..header_size + metadata_size];
    let metadata_runs = if metadata_size > 0 {
        Some(split_metadata(metadata_block)?)
    } else {
        None
    };
    let plural = PluralRule::from_id(header.plural_id).unwrap_or_else(|| {
        warn!(id = header.plural_id, "unknown plural rule id, using default");
        PluralRule::Default
    });

    let entry_table_start = header_size + metadata_size;
    let mut reader = Reader::new(data, entry_table_start);
    let mut raw_entries = Vec::new();
    for _ in 0..header.entry_count {
        raw_entries.push(parse_entry(&mut reader)?);
    }

    let strings_start = reader.pos;
    let string_table_size = header.string_table_size as usize;
    let strings = reader.take(string_table_size, "string table")?;

    let computed = if header.version == VERSION_V1 {
        fnv1a32(strings)
    } else {
        Fnv1a32::new()
            .update(metadata_block)
            .update(&data[entry_table_start..strings_start])
            .update(strings)
            .finish()
    };
    if computed != header.checksum {
        if strict {
            return Err(CatalogError::integrity(format!(
                "checksum mismatch (stored {:08x}, computed {:08x})",
                header.checksum, computed
            )));
        }
        warn!(
            stored = header.checksum,
            computed, "checksum mismatch tolerated in non-strict mode"
        );
    }

    let mut builder = CatalogBuilder::new();
    let metadata = builder.metadata_mut();
    metadata.plural = plural;
    if let Some([locale, fallback, note]) = metadata_runs {
        metadata.locale = utf8_field(locale, "locale", strict)?.into_owned();
        metadata.fallback = utf8_field(fallback, "fallback", strict)?.into_owned();
        metadata.note = utf8_field(note, "note", strict)?.into_owned();
    }
    for entry in raw_entries {
        let start = entry.text_offset as usize;
        let end = start + entry.text_length as usize;
        if end > strings.len() {
            return Err(CatalogError::integrity("text offset outside string table"));
        }
        let text = utf8_field(&strings[start..end], "entry text", strict)?.into_owned();
        builder.insert(entry.key, text, None, None)?;
    }
    builder.finish()
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CatalogError::Oversize { len })
}

/// Longest prefix of `s` that fits a u16 length without splitting a char.
fn capped(s: &str) -> &str {
    let max = usize::from(u16::MAX);
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Encode a catalog as a version 2 binary blob.
///
/// Entries are written in (base, variant) order with sequential text offsets.
/// Labels are not part of the binary format.
pub fn encode(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut entries: Vec<(TokenKey, &str)> = Vec::with_capacity(catalog.len());
    for (key, text) in catalog.entries() {
        let split = TokenKey::split(key);
        if !is_hex_token(&split.base) {
            return Err(CatalogError::format(format!(
                "cannot export key '{}': base is not a hex token",
                key
            )));
        }
        entries.push((split, text));
    }
    entries.sort_by(|a, b| {
        (a.0.base.as_str(), a.0.variant.as_deref().unwrap_or(""))
            .cmp(&(b.0.base.as_str(), b.0.variant.as_deref().unwrap_or("")))
    });

    let mut entry_table = Vec::with_capacity(entries.len() * 24);
    let mut string_table = Vec::new();
    for (key, text) in &entries {
        let variant = key.variant.as_deref().unwrap_or("");
        entry_table.push(key.base.len() as u8);
        entry_table.extend_from_slice(key.base.as_bytes());
        entry_table.push(variant.len() as u8);
        entry_table.extend_from_slice(variant.as_bytes());
        push_u32(&mut entry_table, to_u32(string_table.len())?);
        push_u32(&mut entry_table, to_u32(text.len())?);
        string_table.extend_from_slice(text.as_bytes());
    }

    let meta = catalog.metadata();
    let (locale, fallback, note) = (capped(&meta.locale), capped(&meta.fallback), capped(&meta.note));
    let mut metadata_block =
        Vec::with_capacity(METADATA_HEADER_SIZE + locale.len() + fallback.len() + note.len());
    push_u16(&mut metadata_block, locale.len() as u16);
    push_u16(&mut metadata_block, fallback.len() as u16);
    push_u16(&mut metadata_block, note.len() as u16);
    metadata_block.extend_from_slice(locale.as_bytes());
    metadata_block.extend_from_slice(fallback.as_bytes());
    metadata_block.extend_from_slice(note.as_bytes());

    let checksum = Fnv1a32::new()
        .update(&metadata_block)
        .update(&entry_table)
        .update(&string_table)
        .finish();

    let mut out = Vec::with_capacity(
        HEADER_SIZE_V2 + metadata_block.len() + entry_table.len() + string_table.len(),
    );
    out.extend_from_slice(&MAGIC);
    out.push(VERSION_CURRENT);
    out.push(0);
    out.push(meta.plural.id());
    out.push(0);
    push_u32(&mut out, to_u32(entries.len())?);
    push_u32(&mut out, to_u32(string_table.len())?);
    push_u32(&mut out, checksum);
    push_u32(&mut out, to_u32(metadata_block.len())?);
    out.extend_from_slice(&metadata_block);
    out.extend_from_slice(&entry_table);
    out.extend_from_slice(&string_table);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::text;

    fn sample() -> Catalog {
        text::parse(
            "@meta locale = de_DE\n@meta fallback = en_US\n@meta note = Training\n@meta plural = arabic\n\
             cccccc: third\naaaaaa(first): Hallo %0\nbbbbbb{other}: many\nbbbbbb{one}: one\n",
            true,
        )
        .unwrap()
    }

    /// Hand-built v1 blob: header + entry table + string table.
    fn v1_blob(entries: &[(&str, &str, &str)]) -> Vec<u8> {
        let mut table = Vec::new();
        let mut strings = Vec::new();
        for (base, variant, text) in entries {
            table.push(base.len() as u8);
            table.extend_from_slice(base.as_bytes());
            table.push(variant.len() as u8);
            table.extend_from_slice(variant.as_bytes());
            table.extend_from_slice(&(strings.len() as u32).to_le_bytes());
            table.extend_from_slice(&(text.len() as u32).to_le_bytes());
            strings.extend_from_slice(text.as_bytes());
        }
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&[VERSION_V1, 0, 0, 0]);
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&fnv1a32(&strings).to_le_bytes());
        out.extend_from_slice(&table);
        out.extend_from_slice(&strings);
        out
    }

    /// Hand-built v2 blob without a metadata block.
    fn v2_blob_without_metadata(plural_id: u8, base: &str, text: &str) -> Vec<u8> {
        let mut table = vec![base.len() as u8];
        table.extend_from_slice(base.as_bytes());
        table.push(0);
        table.extend_from_slice(&0u32.to_le_bytes());
        table.extend_from_slice(&(text.len() as u32).to_le_bytes());
        let strings = text.as_bytes();
        let checksum = Fnv1a32::new().update(&table).update(strings).finish();

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&[VERSION_V2, 0, plural_id, 0]);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&table);
        out.extend_from_slice(strings);
        out
    }

    #[test]
    fn fnv_reference_values() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9c_f968);
        let chained = Fnv1a32::new().update(b"foo").update(b"bar").finish();
        assert_eq!(chained, fnv1a32(b"foobar"));
    }

    #[test]
    fn encode_decode_preserves_catalog() {
        let catalog = sample();
        let blob = encode(&catalog).unwrap();
        assert!(looks_like_binary(&blob));
        assert_eq!(blob[4], VERSION_V2);
        assert_eq!(blob[6], PluralRule::Arabic.id());

        let decoded = decode(&blob, true).unwrap();
        assert_eq!(decoded.metadata(), catalog.metadata());
        let a: Vec<_> = catalog.entries().collect();
        let b: Vec<_> = decoded.entries().collect();
        assert_eq!(a, b);
        assert_eq!(decoded.variants_of("bbbbbb").collect::<Vec<_>>(), vec!["one", "other"]);
    }

    #[test]
    fn encode_is_sorted_and_deterministic() {
        let blob = encode(&sample()).unwrap();
        assert_eq!(blob, encode(&sample()).unwrap());

        let meta_size = read_u32_at(&blob, 20) as usize;
        let mut reader = Reader::new(&blob, HEADER_SIZE_V2 + meta_size);
        let mut order = Vec::new();
        for _ in 0..read_u32_at(&blob, 8) {
            order.push(parse_entry(&mut reader).unwrap().key.to_string());
        }
        assert_eq!(order, vec!["aaaaaa", "bbbbbb{one}", "bbbbbb{other}", "cccccc"]);
    }

    #[test]
    fn legacy_v1_is_readable() {
        let blob = v1_blob(&[("ABCDEF", "", "Hello"), ("abcdef", "One", "Hi one")]);
        let catalog = decode(&blob, true).unwrap();
        assert_eq!(catalog.get("abcdef"), Some("Hello"));
        assert_eq!(catalog.get("abcdef{one}"), Some("Hi one"));
        assert_eq!(catalog.plural_rule(), PluralRule::Default);
    }

    #[test]
    fn v2_without_metadata_block() {
        let blob = v2_blob_without_metadata(PluralRule::Slavic.id(), "abcdef", "hi");
        let catalog = decode(&blob, true).unwrap();
        assert_eq!(catalog.get("abcdef"), Some("hi"));
        assert_eq!(catalog.plural_rule(), PluralRule::Slavic);
        assert_eq!(catalog.metadata().locale, "");
        assert_eq!(catalog.metadata().fallback, "");
        assert_eq!(catalog.metadata().note, "");
    }

    #[test]
    fn unknown_plural_id_falls_back_to_default() {
        let blob = v2_blob_without_metadata(3, "abcdef", "hi");
        for strict in [true, false] {
            let catalog = decode(&blob, strict).unwrap();
            assert_eq!(catalog.plural_rule(), PluralRule::Default);
            assert_eq!(catalog.get("abcdef"), Some("hi"));
        }

        let mut blob = encode(&sample()).unwrap();
        blob[6] = 0xff;
        assert_eq!(decode(&blob, true).unwrap().plural_rule(), PluralRule::Default);
    }

    #[test]
    fn checksum_mismatch_depends_on_strictness() {
        let mut blob = encode(&sample()).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        assert!(matches!(decode(&blob, true), Err(CatalogError::Integrity(_))));
        let lenient = decode(&blob, false).unwrap();
        assert_eq!(lenient.get("cccccc"), Some("thire"));
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(decode(b"NOPE", false), Err(CatalogError::Format { .. })));
        let mut blob = encode(&sample()).unwrap();
        blob[4] = 9;
        assert!(matches!(decode(&blob, false), Err(CatalogError::Format { .. })));
        let blob = encode(&sample()).unwrap();
        assert!(matches!(decode(&blob[..22], false), Err(CatalogError::Integrity(_))));
    }

    #[test]
    fn rejects_inconsistent_metadata() {
        let mut blob = encode(&sample()).unwrap();
        // Bump locale_len so the three lengths no longer add up.
        blob[HEADER_SIZE_V2] += 1;
        assert!(matches!(decode(&blob, false), Err(CatalogError::Integrity(_))));

        let mut blob = encode(&sample()).unwrap();
        blob[20..24].copy_from_slice(&3u32.to_le_bytes());
        assert!(decode(&blob, false).is_err());

        let mut blob = encode(&sample()).unwrap();
        blob[20..24].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&blob, false), Err(CatalogError::Integrity(_))));
    }

    #[test]
    fn rejects_entry_violations() {
        let blob = v1_blob(&[("abcde", "", "short token")]);
        assert!(matches!(decode(&blob, false), Err(CatalogError::Integrity(_))));

        let blob = v1_blob(&[("zzzzzz", "", "not hex")]);
        assert!(matches!(decode(&blob, false), Err(CatalogError::Format { .. })));

        let blob = v1_blob(&[("abcdef", "b d", "bad variant")]);
        assert!(matches!(decode(&blob, false), Err(CatalogError::Format { .. })));

        let blob = v1_blob(&[("abcdef", "", "x"), ("ABCDEF", "", "y")]);
        assert!(matches!(decode(&blob, false), Err(CatalogError::DuplicateKey { .. })));

        let blob = v1_blob(&[]);
        assert!(decode(&blob, false).is_err());
    }

    #[test]
    fn rejects_text_outside_string_table() {
        let mut blob = v1_blob(&[("abcdef", "", "Hello")]);
        // text_length sits right before the string table.
        let len_at = HEADER_SIZE_V1 + 1 + 6 + 1 + 4;
        blob[len_at..len_at + 4].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(decode(&blob, false), Err(CatalogError::Integrity(_))));
    }

    #[test]
    fn truncated_string_table_is_rejected() {
        let blob = encode(&sample()).unwrap();
        assert!(matches!(
            decode(&blob[..blob.len() - 2], false),
            Err(CatalogError::Integrity(_))
        ));
    }

    #[test]
    fn metadata_is_capped_on_char_boundary() {
        let long = "é".repeat(40_000);
        let cut = capped(&long);
        assert!(cut.len() <= usize::from(u16::MAX));
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
