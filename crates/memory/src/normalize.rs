//! Content-length policy applied to everything handed to the memory store.

use std::borrow::Cow;

/// Largest message body, in characters, that the store accepts.
pub const MAX_CONTENT_CHARS: usize = 4096;

/// Characters reserved at the end of a truncated body.  Slightly more than
/// the marker needs.
pub const TRUNCATION_RESERVE: usize = 50;

/// Appended to every truncated body.
pub const TRUNCATION_MARKER: &str = "\n\n[Message truncated due to length]";

/// Truncate `s` to at most `max_chars` Unicode scalar values, returning a
/// sub-slice.
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Fit `text` into `limit` characters.
///
/// Text that already fits is returned untouched (borrowed).  Longer text keeps
/// its first `limit - TRUNCATION_RESERVE` characters followed by
/// [`TRUNCATION_MARKER`].  A limit too small to hold the marker gets a plain
/// hard cut.  The result never exceeds `limit` characters, and normalizing an
/// already-normalized string is a no-op.
pub fn normalize(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }

    if limit < TRUNCATION_MARKER.chars().count() {
        return Cow::Borrowed(truncate_str(text, limit));
    }

    let head = truncate_str(text, limit.saturating_sub(TRUNCATION_RESERVE));
    let mut out = String::with_capacity(head.len() + TRUNCATION_MARKER.len());
    out.push_str(head);
    out.push_str(TRUNCATION_MARKER);
    Cow::Owned(out)
}

/// [`normalize`] with the store's fixed limit.
pub fn normalize_content(text: &str) -> Cow<'_, str> {
    normalize(text, MAX_CONTENT_CHARS)
}
