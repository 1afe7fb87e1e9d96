//! Document indices count UTF-16 code units, not bytes or chars.

pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Converts a byte index into `text` to a UTF-16 unit offset.
pub fn utf16_offset(text: &str, byte_index: usize) -> usize {
    utf16_len(&text[..byte_index])
}
