//! Slug generation.
//!
//! A slug is the public, URL-safe handle of a user derived from their
//! display name. Generation is pure; uniqueness is checked through an
//! oracle supplied by the caller so the same logic serves storage-backed
//! allocation and tests.

use crate::constants::{SLUG_FALLBACK, SLUG_SEPARATOR};

/// Map a single lower-case character to its ASCII spelling.
///
/// Returns `None` for characters with no table entry; those are kept
/// only if they are already allowed.
fn transliterate(c: char) -> Option<&'static str> {
    let mapped = match c {
        // Turkish
        'ı' => "i",
        'ğ' => "g",
        'ü' => "u",
        'ş' => "s",
        'ö' => "o",
        'ç' => "c",
        // Latin-1
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
        'ù' | 'ú' | 'û' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(mapped)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// Derive the base slug for a display name.
///
/// Lower-cases, transliterates, drops anything outside `[a-z0-9-]` and
/// joins whitespace-separated words with a single separator. A name with
/// nothing usable becomes [`SLUG_FALLBACK`].
pub fn base_slug(display_name: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    let mut pending_separator = false;

    for c in display_name.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            pending_separator = true;
            continue;
        }

        let mut buf = [0u8; 4];
        let piece: &str = match transliterate(c) {
            Some(ascii) => ascii,
            None if is_allowed(c) => c.encode_utf8(&mut buf),
            None => continue,
        };

        if pending_separator && !slug.is_empty() {
            slug.push(SLUG_SEPARATOR);
        }
        pending_separator = false;
        slug.push_str(piece);
    }

    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug
    }
}

/// The candidate sequence for a base: `base`, `base_1`, `base_2`, ...
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string())
        .chain((1u64..).map(move |n| format!("{}{}{}", base, SLUG_SEPARATOR, n)))
}

/// Generate a slug for `display_name` that `is_taken` reports free.
pub fn generate<F>(display_name: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = base_slug(display_name);
    let found = candidates(&base).find(|candidate| !is_taken(candidate));
    found.unwrap_or(base)
}
