// SPDX-License-Identifier: PMPL-1.0-or-later

//! Plural rule families.
//!
//! Three hand-coded families cover the catalogs we ship. Each maps a count
//! to the name of the variant suffix that holds the matching text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plural category, named the way catalog variants are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// The variant name this category selects (`"one"`, `"few"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plural rule family recorded in catalog metadata.
///
/// The numeric id is what the binary header stores in byte 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralRule {
    #[default]
    Default,
    Slavic,
    Arabic,
}

impl PluralRule {
    pub fn id(&self) -> u8 {
        match self {
            PluralRule::Default => 0,
            PluralRule::Slavic => 1,
            PluralRule::Arabic => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(PluralRule::Default),
            1 => Some(PluralRule::Slavic),
            2 => Some(PluralRule::Arabic),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PluralRule::Default => "default",
            PluralRule::Slavic => "slavic",
            PluralRule::Arabic => "arabic",
        }
    }

    /// Pick the category for `count`. Negative counts are always `Other`.
    pub fn categorize(&self, count: i64) -> PluralCategory {
        if count < 0 {
            return PluralCategory::Other;
        }

        match self {
            PluralRule::Default => match count {
                0 => PluralCategory::Zero,
                1 => PluralCategory::One,
                _ => PluralCategory::Other,
            },
            PluralRule::Slavic => {
                let m10 = count % 10;
                let m100 = count % 100;
                if m10 == 1 && m100 != 11 {
                    PluralCategory::One
                } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
                    PluralCategory::Few
                } else if m10 == 0 || (5..=9).contains(&m10) || (11..=14).contains(&m100) {
                    PluralCategory::Many
                } else {
                    PluralCategory::Other
                }
            }
            PluralRule::Arabic => {
                let m100 = count % 100;
                match count {
                    0 => PluralCategory::Zero,
                    1 => PluralCategory::One,
                    2 => PluralCategory::Two,
                    _ if (3..=10).contains(&m100) => PluralCategory::Few,
                    _ if (11..=99).contains(&m100) => PluralCategory::Many,
                    _ => PluralCategory::Other,
                }
            }
        }
    }

    /// Variant name selected for `count`.
    pub fn variant_for(&self, count: i64) -> &'static str {
        self.categorize(count).as_str()
    }
}

impl fmt::Display for PluralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PluralRule {
    type Err = String;

    /// Case-insensitive: `default`, `slavic` or `arabic`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(PluralRule::Default),
            "slavic" => Ok(PluralRule::Slavic),
            "arabic" => Ok(PluralRule::Arabic),
            other => Err(format!("unknown plural rule '{}'", other)),
        }
    }
}
