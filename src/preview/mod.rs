//! Preview support: signed URL cache and content-type checks.

mod cache;
mod signer;

pub use cache::{Clock, PreviewUrlCache, SystemClock, DEFAULT_PREVIEW_TTL};
pub use signer::{StorageSigner, UrlSigner};

/// Content-type prefixes the explorer can render inline.
const PREVIEWABLE_PREFIXES: &[&str] = &["image/", "video/", "audio/", "text/"];

/// Exact content types the explorer can render inline.
const PREVIEWABLE_TYPES: &[&str] = &["application/pdf", "application/json"];

/// Whether a file with this content type can be previewed.
///
/// Parameters after `;` are ignored and matching is case-insensitive.
pub fn is_previewable(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.is_empty() {
        return false;
    }

    PREVIEWABLE_TYPES.contains(&essence.as_str())
        || PREVIEWABLE_PREFIXES
            .iter()
            .any(|prefix| essence.len() > prefix.len() && essence.starts_with(prefix))
}

/// Guess a content type from a file name's extension.
pub fn guess_content_type(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
