//! Internationalization: localized strings for replies and digests.
//!
//! Uses a simple `t(key, lang)` function for static strings and
//! `format` helpers for strings with interpolation.
//! Supported languages: Chinese (default) and English.

mod format;
mod labels;

#[cfg(test)]
mod tests;

pub use format::*;

use skydigest_core::conversation::Language;

/// Return a localized static string for `key` in the given `lang`.
pub fn t(key: &str, lang: Language) -> &'static str {
    labels::lookup(key, lang).unwrap_or("???")
}
