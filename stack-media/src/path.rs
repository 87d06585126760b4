//! Virtual path helpers.
//!
//! A virtual path looks like `media://wp-content/uploads/2024/01/cat.jpg`.
//! Everything after the scheme is the blob key.

use stack_blob::BlobKey;

/// Split `scheme://rest` into its scheme and remainder.
///
/// Returns `None` for paths without a `://` separator or with an empty or
/// malformed scheme.
pub fn split_scheme(path: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = path.split_once("://")?;
    if is_valid_scheme(scheme) {
        Some((scheme, rest))
    } else {
        None
    }
}

/// Scheme names follow URI rules: a letter, then letters, digits, `+`, `-`, `.`
pub fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Strip every leading `scheme:` prefix and slash from `path`.
///
/// Thumbnail pipelines sometimes run paths through the upload filters more
/// than once, so the prefix may appear repeatedly. The result is stable under
/// repeated application.
pub fn trim_path<'a>(path: &'a str, scheme: &str) -> &'a str {
    let mut rest = path;
    loop {
        let trimmed = rest.trim_start_matches(['/', '\\']);
        let trimmed = trimmed
            .strip_prefix(scheme)
            .and_then(|r| r.strip_prefix(':'))
            .unwrap_or(trimmed);

        if trimmed.len() == rest.len() {
            return rest;
        }
        rest = trimmed;
    }
}

/// The blob key addressed by a virtual path
pub fn to_key(path: &str, scheme: &str) -> BlobKey {
    BlobKey::new(trim_path(path, scheme))
}

/// `scheme://key`
pub fn virtual_path(scheme: &str, key: &str) -> String {
    format!("{}://{}", scheme, key.trim_start_matches(['/', '\\']))
}

/// Extension of the final path segment, without the dot.
///
/// Trailing slashes are ignored; a segment ending in `.` has no extension.
pub fn extension(path: &str) -> Option<&str> {
    let path = path.trim_end_matches(['/', '\\']);
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Paths whose final segment has no extension are directories.
pub fn is_dir(path: &str, scheme: &str) -> bool {
    extension(trim_path(path, scheme)).is_none()
}
