//! URL-safe slugs derived from display names

use unicode_normalization::UnicodeNormalization;

const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Derive a slug: lowercase, accents stripped, runs of anything outside
/// `[a-z0-9]` collapsed to a single `-`, no leading or trailing `-`.
///
/// ```
/// assert_eq!(yooreed::core::slug::slugify("Vases en Verre"), "vases-en-verre");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.to_lowercase().nfd().filter(|c| !COMBINING_DIACRITICS.contains(c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
