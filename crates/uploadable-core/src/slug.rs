//! Filesystem and URL safe slugs for stored filenames.

/// Longest slug kept in a stored filename
pub const MAX_SLUG_LENGTH: usize = 100;

/// Convert text into a URL-safe ASCII slug.
///
/// Lowercases, maps every character that is not an ASCII letter or digit to a
/// hyphen, collapses runs of hyphens and trims them from both ends. Long slugs
/// are cut at the last hyphen before [`MAX_SLUG_LENGTH`].
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        // Pure ASCII, so any byte index is a char boundary
        let truncated = &slug[..MAX_SLUG_LENGTH];
        return match truncated.rfind('-') {
            Some(last_hyphen) => truncated[..last_hyphen].to_string(),
            None => truncated.to_string(),
        };
    }

    slug
}
