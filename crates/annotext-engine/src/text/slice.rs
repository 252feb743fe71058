use std::ops::Range;

use xi_rope::Rope;

/// Extracts the text for a byte range from the rope as an owned String.
///
/// This allocates; prefer working with spans where possible.
pub fn slice_to_string(rope: &Rope, range: Range<usize>) -> String {
    rope.slice_to_cow(range).into_owned()
}

/// Truncates `s` to at most `max` characters with a "..." suffix if needed.
///
/// Used for log lines and verification snippets.
pub fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => {
            let mut out = s[..cut].to_string();
            out.push_str("...");
            out
        }
        None => s.to_string(),
    }
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Maps a UTF-16 offset inside `s` to a byte offset.
///
/// Returns `None` when the offset is past the end or falls inside a
/// surrogate pair.
pub fn utf16_to_byte(s: &str, units: usize) -> Option<usize> {
    let mut acc = 0;
    for (idx, ch) in s.char_indices() {
        if acc == units {
            return Some(idx);
        }
        if acc > units {
            return None;
        }
        acc += ch.len_utf16();
    }
    (acc == units).then_some(s.len())
}
