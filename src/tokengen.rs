// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fresh token generation
//!
//! Produces random lowercase hex tokens that collide neither with tokens
//! already defined in catalog sources nor with each other.

use crate::format;
use crate::token::{MAX_TOKEN_LEN, MIN_TOKEN_LEN};
use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

pub const DEFAULT_TOKEN_LENGTH: usize = 8;

/// Consecutive collisions tolerated before giving up.
const MAX_COLLISIONS: usize = 10_000;

/// Entry head at line start: token, optional variant, optional label, colon.
const TOKEN_HEAD: &str = r"^\s*([0-9a-fA-F]{6,32})(?:\{[0-9a-zA-Z_\-]+\})?(?:\(.*\))?\s*:";

/// Collect the base tokens defined in `path`: a single catalog file, or
/// every `*.txt` below a directory. A missing path yields an empty set.
pub fn existing_tokens(path: &Path) -> Result<BTreeSet<String>> {
    let mut tokens = BTreeSet::new();
    if !path.exists() {
        return Ok(tokens);
    }

    let head = Regex::new(TOKEN_HEAD).context("compiling token head pattern")?;
    let files: Vec<_> = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        let mut files: Vec<_> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();
        files
    };

    for file in files {
        let text = match fs::read(&file)
            .map_err(anyhow::Error::from)
            .and_then(|data| format::decode_text(&data, false).map_err(anyhow::Error::from))
        {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %file.display(), "skipping unreadable catalog: {:#}", err);
                continue;
            }
        };
        for line in text.lines() {
            if let Some(caps) = head.captures(line) {
                tokens.insert(caps[1].to_ascii_lowercase());
            }
        }
    }

    Ok(tokens)
}

/// One random lowercase hex token of `length` characters.
pub fn generate_token(length: usize) -> Result<String> {
    if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&length) {
        bail!(
            "token length must be between {} and {}, got {}",
            MIN_TOKEN_LEN,
            MAX_TOKEN_LEN,
            length
        );
    }

    let mut bytes = vec![0u8; length.div_ceil(2)];
    getrandom::getrandom(&mut bytes)
        .map_err(|err| anyhow!("reading system randomness: {}", err))?;
    let mut token = hex::encode(bytes);
    token.truncate(length);
    Ok(token)
}

/// `count` new tokens, unique against `taken` and each other. Each issued
/// token is added to `taken`.
pub fn generate_unique(length: usize, count: usize, taken: &mut BTreeSet<String>) -> Result<Vec<String>> {
    let mut issued = Vec::with_capacity(count);
    let mut collisions = 0;

    while issued.len() < count {
        let token = generate_token(length)?;
        if taken.insert(token.clone()) {
            issued.push(token);
            collisions = 0;
        } else {
            collisions += 1;
            if collisions >= MAX_COLLISIONS {
                bail!("token space of length {} looks exhausted", length);
            }
        }
    }

    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::is_hex_token;
    use tempfile::TempDir;

    #[test]
    fn generated_tokens_are_valid() {
        for length in [6, 7, 8, 31, 32] {
            let token = generate_token(length).unwrap();
            assert_eq!(token.len(), length);
            assert!(is_hex_token(&token));
            assert_eq!(token, token.to_ascii_lowercase());
        }
        assert!(generate_token(5).is_err());
        assert!(generate_token(33).is_err());
    }

    #[test]
    fn existing_tokens_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("de")).unwrap();
        fs::write(
            dir.path().join("en.txt"),
            "# comment\nAABBCC(Title): x\naabbcc{one}: y\n  deadbeef : z\nnot a token: w\n",
        )
        .unwrap();
        fs::write(dir.path().join("de/de.txt"), "112233{Few}(L): a\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ffffff: ignored\n").unwrap();

        let tokens = existing_tokens(dir.path()).unwrap();
        let expected: BTreeSet<String> = ["112233", "aabbcc", "deadbeef"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);

        let single = existing_tokens(&dir.path().join("de/de.txt")).unwrap();
        assert_eq!(single.len(), 1);
        assert!(existing_tokens(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn unique_generation_skips_taken() {
        let mut taken: BTreeSet<String> = BTreeSet::new();
        let tokens = generate_unique(6, 50, &mut taken).unwrap();
        assert_eq!(tokens.len(), 50);
        let distinct: BTreeSet<&String> = tokens.iter().collect();
        assert_eq!(distinct.len(), 50);
        assert_eq!(taken.len(), 50);
    }
}
