//! Branch-safe slugs derived from free text.

/// Convert free text to a lowercase, hyphen-separated slug.
///
/// Every character outside `[a-z0-9-]` (after lower-casing) becomes a hyphen,
/// runs of hyphens collapse to one, and hyphens at either end are dropped.
/// Empty input yields an empty slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}
