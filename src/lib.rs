// SPDX-License-Identifier: PMPL-1.0-or-later

//! hexloc: embeddable localization catalogs keyed by hex tokens.
//!
//! A catalog maps opaque hex tokens to templated text. Catalogs are authored
//! in a line-oriented text format and shipped either as text or as a compact,
//! checksummed binary format. Lookups expand nested `@token` references,
//! `%N` positional arguments and plural variants at call time.
//!
//! ENGINE PILLARS:
//! 1. **Formats**: text parser and versioned binary codec, both all-or-nothing.
//! 2. **Resolve**: recursive template expansion with cycle and depth guards.
//! 3. **Check**: placeholder-gap and reference-cycle analysis of a catalog.
//! 4. **Engine**: atomic publication of a fully built catalog; readers never
//!    observe a half-loaded state.
//!
//! ```
//! use hexloc::Engine;
//!
//! let engine = Engine::new();
//! engine.load_text("a1b2c3: Hello, %0!\n", true).unwrap();
//! assert_eq!(engine.translate("A1B2C3", &["=world"]), "Hello, world!");
//! ```

pub mod catalog;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod locale;
pub mod marshal;
pub mod plural;
pub mod resolve;
pub mod token;
pub mod tokengen;

pub use catalog::{Catalog, CatalogBuilder, Metadata};
pub use check::{CheckReport, Finding, StatusCode, Verdict};
pub use engine::Engine;
pub use error::{CatalogError, Result};
pub use plural::{PluralCategory, PluralRule};
pub use resolve::Resolver;
pub use token::TokenKey;
