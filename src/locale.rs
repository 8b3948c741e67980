// SPDX-License-Identifier: PMPL-1.0-or-later

//! Locale tags recorded in catalog metadata.
//!
//! Catalogs carry free-form `locale` and `fallback` strings such as `de_DE`
//! or `pt-BR`. Only the primary subtag is checked here, against ISO 639-1.
//!
//! Reference: <https://www.loc.gov/standards/iso639-2/php/code_list.php>

use serde::Serialize;

/// ISO 639-1 codes, sorted for binary search.
const ISO_639_1: &[&str] = &[
    "aa", "ab", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh", "bi",
    "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da", "de",
    "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr", "fy",
    "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz", "ia",
    "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj", "kk",
    "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln", "lo",
    "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb", "nd",
    "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl",
    "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl",
    "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk",
    "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa",
    "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

/// (code, English name, native name) for languages we name in output.
const NAMES: &[(&str, &str, &str)] = &[
    ("ar", "Arabic", "العربية"),
    ("cs", "Czech", "Čeština"),
    ("da", "Danish", "Dansk"),
    ("de", "German", "Deutsch"),
    ("el", "Greek", "Ελληνικά"),
    ("en", "English", "English"),
    ("es", "Spanish", "Español"),
    ("fi", "Finnish", "Suomi"),
    ("fr", "French", "Français"),
    ("he", "Hebrew", "עברית"),
    ("hi", "Hindi", "हिन्दी"),
    ("hr", "Croatian", "Hrvatski"),
    ("hu", "Hungarian", "Magyar"),
    ("id", "Indonesian", "Bahasa Indonesia"),
    ("it", "Italian", "Italiano"),
    ("ja", "Japanese", "日本語"),
    ("ko", "Korean", "한국어"),
    ("nb", "Norwegian Bokmål", "Norsk bokmål"),
    ("nl", "Dutch", "Nederlands"),
    ("no", "Norwegian", "Norsk"),
    ("pl", "Polish", "Polski"),
    ("pt", "Portuguese", "Português"),
    ("ro", "Romanian", "Română"),
    ("ru", "Russian", "Русский"),
    ("sk", "Slovak", "Slovenčina"),
    ("sr", "Serbian", "Српски"),
    ("sv", "Swedish", "Svenska"),
    ("tr", "Turkish", "Türkçe"),
    ("uk", "Ukrainian", "Українська"),
    ("vi", "Vietnamese", "Tiếng Việt"),
    ("zh", "Chinese", "中文"),
];

/// `true` for a known lowercase ISO 639-1 two-letter code.
pub fn is_valid_iso639_1(code: &str) -> bool {
    ISO_639_1.binary_search(&code).is_ok()
}

fn names(code: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    NAMES
        .binary_search_by(|(c, _, _)| c.cmp(&code))
        .ok()
        .map(|idx| &NAMES[idx])
}

/// English name of a language code, for the languages we name.
pub fn language_name(code: &str) -> Option<&'static str> {
    names(code).map(|(_, english, _)| *english)
}

/// Name of the language written in the language itself.
pub fn native_name(code: &str) -> Option<&'static str> {
    names(code).map(|(_, _, native)| *native)
}

/// Lowercased primary subtag: `de_DE` and `DE-at` both give `de`.
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['_', '-', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// What we know about one locale tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleInfo {
    pub tag: String,
    pub language: String,
    pub valid: bool,
    pub name: Option<&'static str>,
    pub native: Option<&'static str>,
}

/// Describe `tag`. Returns `None` for an empty tag.
pub fn describe(tag: &str) -> Option<LocaleInfo> {
    let tag = tag.trim();
    if tag.is_empty() {
        return None;
    }
    let language = primary_subtag(tag);
    Some(LocaleInfo {
        tag: tag.to_string(),
        valid: is_valid_iso639_1(&language),
        name: language_name(&language),
        native: native_name(&language),
        language,
    })
}
