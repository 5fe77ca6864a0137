//! Host locale ↔ DeepL language code mapping
//!
//! The host identifies languages with its own locale codes (`eng-GB`,
//! `ger-DE`, ...). DeepL wants ISO-like tags, and it is asymmetric about
//! them: a *target* may carry a region (`en-GB`, `pt-BR`) while a *source*
//! must be the bare language (`en`, `pt`).
//!
//! # Example
//!
//! ```
//! use deepl_handler::language::{is_allowed_language, map_language};
//!
//! assert_eq!(map_language("eng-GB", false).unwrap(), "en-GB");
//! assert_eq!(map_language("eng-GB", true).unwrap(), "en");
//! assert!(!is_allowed_language("xyz-CC"));
//! ```

use crate::error::{TranslatorError, TranslatorResult};

/// One row of the language table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Locale code used by the host CMS
    pub host: &'static str,
    /// Language code understood by DeepL, possibly with a region suffix
    pub provider: &'static str,
}

const fn entry(host: &'static str, provider: &'static str) -> LanguageEntry {
    LanguageEntry { host, provider }
}

/// Supported host locales and the DeepL code each one maps to
pub const LANGUAGE_TABLE: &[LanguageEntry] = &[
    entry("cze-CZ", "cs"),
    entry("ger-DE", "de"),
    entry("ell-GR", "el"),
    entry("eng-GB", "en-GB"),
    entry("esl-ES", "es"),
    entry("fin-FI", "fi"),
    entry("fre-FR", "fr"),
    entry("hun-HU", "hu"),
    entry("ind-ID", "id"),
    entry("ita-IT", "it"),
    entry("jpn-JP", "ja"),
    entry("nor-NO", "nb"),
    entry("dut-NL", "nl"),
    entry("pol-PL", "pl"),
    entry("por-PT", "pt-PT"),
    entry("por-BR", "pt-BR"),
    entry("rus-RU", "ru"),
    entry("slk-SK", "sk"),
    entry("swe-SE", "sv"),
    entry("tur-TR", "tr"),
    entry("ukr-UA", "uk"),
    entry("chi-CN", "zh"),
];

/// DeepL languages with no host locale assigned yet.
///
/// Kept as data so a new host locale only needs a table row.
pub const UNSUPPORTED_PROVIDER_LANGUAGES: &[&str] =
    &["bg", "da", "et", "ko", "lt", "lv", "ro", "sl"];

/// Map a host locale code to the DeepL language code
///
/// With `as_source` set only the language subtag is returned (everything
/// before the first `-`), since DeepL rejects regional source languages.
///
/// # Errors
///
/// `TranslatorError::UnsupportedLanguage` if the code has no table entry.
pub fn map_language(code: &str, as_source: bool) -> TranslatorResult<&'static str> {
    let provider = LANGUAGE_TABLE
        .iter()
        .find(|e| e.host == code)
        .map(|e| e.provider)
        .ok_or_else(|| TranslatorError::UnsupportedLanguage(code.to_string()))?;

    if as_source {
        return Ok(language_subtag(provider));
    }

    Ok(provider)
}

/// Side-effect-free probe: can this host locale be translated to?
pub fn is_allowed_language(code: &str) -> bool {
    map_language(code, false).is_ok()
}

/// Iterate over all supported host locales
pub fn supported_languages() -> impl Iterator<Item = &'static LanguageEntry> {
    LANGUAGE_TABLE.iter()
}

fn language_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}
