//! URL slug generation.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Build a URL slug from a display name.
///
/// Lowercases, strips diacritics, drops apostrophes and turns every other
/// run of non-alphanumeric characters into a single hyphen. Output is either
/// empty or matches `^[a-z0-9]+(-[a-z0-9]+)*$`, so the function is idempotent.
///
/// ```
/// use tourism_cms::slug::generate_slug;
///
/// assert_eq!(generate_slug("La Maison d'à Côté"), "la-maison-da-cote");
/// assert_eq!(generate_slug("  Musée -- du Vin  "), "musee-du-vin");
/// ```
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.nfd() {
        if is_combining_mark(c) || c == '\'' || c == '\u{2019}' {
            continue;
        }

        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
