//! Small path and text helpers shared across the scan phases.

use std::borrow::Cow;
use std::path::Path;

/// Root-relative path rendered with forward slashes on every platform.
pub(crate) fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for part in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&part.as_os_str().to_string_lossy());
    }
    out
}

/// Read a file as UTF-8, replacing invalid sequences instead of failing.
pub(crate) fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(_) => String::from_utf8(bytes).unwrap_or_default(),
        Cow::Owned(s) => s,
    })
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

/// The parent of a slash-separated relative path ("" at the top).
pub(crate) fn slash_parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}

/// The basename of a slash-separated relative path.
pub(crate) fn slash_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
