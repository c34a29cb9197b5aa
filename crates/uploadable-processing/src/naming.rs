//! Stored filename construction.
//!
//! Accepted files are stored as `[prefix_]slug_token.ext`, where the slug comes
//! from the client's filename and the token makes the name unique.

use uploadable_core::slugify;
use uuid::Uuid;

/// Slug used when the client's filename has no ASCII letters or digits
const FALLBACK_SLUG: &str = "file";

/// Source of unique filename tokens.
///
/// Implementations must be safe to call from concurrent validations.
pub trait TokenGenerator: Send + Sync {
    fn next_token(&self) -> String;
}

/// Random UUID v4 tokens in simple (32 hex digit) form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokens;

impl TokenGenerator for UuidTokens {
    fn next_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Split a client filename into its lowercased base name and extension.
///
/// The extension is whatever follows the last `.`; `None` when there is no
/// dot, the extension is empty, or it is not plain ASCII alphanumerics.
pub fn split_filename(filename: &str) -> Option<(String, String)> {
    let (base, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((base.to_lowercase(), extension.to_lowercase()))
}

/// Build the stored filename for an accepted upload.
pub fn stored_filename(prefix: Option<&str>, base_name: &str, token: &str, extension: &str) -> String {
    let slug = slugify(base_name);
    let slug = if slug.is_empty() {
        FALLBACK_SLUG
    } else {
        slug.as_str()
    };

    match prefix {
        Some(prefix) => format!("{}_{}_{}.{}", prefix, slug, token, extension),
        None => format!("{}_{}.{}", slug, token, extension),
    }
}
