//! Escaping of reserved characters.

use std::{borrow::Cow, fmt};

/// Returns `true` if `c` must be preceded by a backslash when written as part of a measurement name, tag key, tag
/// value, or field key.
#[inline]
pub(crate) const fn is_reserved(c: char) -> bool {
    matches!(c, ' ' | ',' | '=' | '"')
}

/// Escapes the given string so that it can be used as a measurement name, tag key, tag value, or field key.
///
/// Spaces, commas, equals signs, and double quotes are each prefixed with a backslash. Every other character,
/// including the backslash itself, is passed through unchanged.
///
/// When `src` contains no reserved characters, it is returned as-is without allocating.
pub fn escape(src: &str) -> Cow<'_, str> {
    if !src.contains(is_reserved) {
        return Cow::Borrowed(src);
    }

    let mut escaped = String::with_capacity(src.len() + 4);
    write_escaped(&mut escaped, src);
    Cow::Owned(escaped)
}

/// Writes the escaped form of `src` to the end of `buffer`.
///
/// See [`escape`] for the escaping rules.
pub fn write_escaped(buffer: &mut String, src: &str) {
    // Writing to a `String` never fails.
    let _ = write_escaped_to(buffer, src);
}

pub(crate) fn write_escaped_to<W: fmt::Write>(writer: &mut W, src: &str) -> fmt::Result {
    let mut rest = src;
    while let Some(pos) = rest.find(is_reserved) {
        // Reserved characters are all single-byte, so `pos + 1` is always a character boundary.
        writer.write_str(&rest[..pos])?;
        writer.write_char('\\')?;
        writer.write_str(&rest[pos..=pos])?;
        rest = &rest[pos + 1..];
    }
    writer.write_str(rest)
}
