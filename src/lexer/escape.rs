//! Escape-sequence decoding for quoted string literals.
//!
//! Supported escapes: single-letter (`\a \b \f \n \r \t \v`), quote and
//! backslash escapes, octal (`\NNN`, 1-3 digits, first digit 0-3), 2-digit
//! hex (`\xHH`), 4- and 8-digit Unicode code points (`\uHHHH`,
//! `\uHHHHHHHH`), and backslash-newline line continuation. Unrecognized
//! single-character escapes become a deferred marker: the backslash is
//! dropped and the following character is kept literally.

use super::cursor::Cursor;
use super::span::Span;
use crate::error::Diagnostic;

/// The result of decoding one escape sequence.
pub(super) enum Escape {
    /// A decoded character to append to the string content.
    Char(char),
    /// Backslash-newline: nothing is emitted.
    LineContinuation,
    /// Unknown escape: the backslash is dropped and the marker is consumed
    /// on the next character, which is kept literally.
    Deferred,
}

/// Decode one escape sequence. The cursor sits just past the backslash.
pub(super) fn scan_escape(cursor: &mut Cursor<'_>) -> Result<Escape, Diagnostic> {
    let start = cursor.offset() - 1;

    let Some(c) = cursor.peek() else {
        // Backslash at end of input; the enclosing string scan reports the
        // unterminated literal.
        return Ok(Escape::Deferred);
    };

    match c {
        'a' => consume_as(cursor, '\x07'),
        'b' => consume_as(cursor, '\x08'),
        'f' => consume_as(cursor, '\x0C'),
        'n' => consume_as(cursor, '\n'),
        'r' => consume_as(cursor, '\r'),
        't' => consume_as(cursor, '\t'),
        'v' => consume_as(cursor, '\x0B'),
        '\\' | '\'' | '"' => consume_as(cursor, c),
        '\n' => {
            cursor.advance();
            Ok(Escape::LineContinuation)
        }
        '0'..='3' => scan_octal(cursor, start),
        'x' => {
            cursor.advance();
            scan_hex(cursor, start)
        }
        'u' => {
            cursor.advance();
            scan_unicode(cursor, start)
        }
        _ => Ok(Escape::Deferred),
    }
}

fn consume_as(cursor: &mut Cursor<'_>, decoded: char) -> Result<Escape, Diagnostic> {
    cursor.advance();
    Ok(Escape::Char(decoded))
}

/// Octal escape: 1-3 digits, first already checked to be 0-3.
fn scan_octal(cursor: &mut Cursor<'_>, start: u32) -> Result<Escape, Diagnostic> {
    let mut value: u32 = 0;
    let mut digits = 0;
    while digits < 3 {
        match cursor.peek() {
            Some(c @ '0'..='7') => {
                value = value * 8 + c.to_digit(8).unwrap_or(0);
                cursor.advance();
                digits += 1;
            }
            _ => break,
        }
    }

    match char::from_u32(value) {
        Some(decoded) => Ok(Escape::Char(decoded)),
        None => Err(Diagnostic::syntax(
            Span::new(start, cursor.offset()),
            "Invalid octal escape",
        )),
    }
}

/// Hex escape: exactly 2 digits after `\x`.
fn scan_hex(cursor: &mut Cursor<'_>, start: u32) -> Result<Escape, Diagnostic> {
    let mut value: u32 = 0;
    for _ in 0..2 {
        match cursor.peek().and_then(|c| c.to_digit(16)) {
            Some(digit) => {
                value = value * 16 + digit;
                cursor.advance();
            }
            None => {
                return Err(Diagnostic::syntax(
                    Span::new(start, cursor.offset()),
                    "Invalid hex escape",
                ));
            }
        }
    }

    match char::from_u32(value) {
        Some(decoded) => Ok(Escape::Char(decoded)),
        None => Err(Diagnostic::syntax(
            Span::new(start, cursor.offset()),
            "Invalid hex escape",
        )),
    }
}

/// Unicode escape: 4 or 8 hex digits after `\u`, encoded as UTF-8.
fn scan_unicode(cursor: &mut Cursor<'_>, start: u32) -> Result<Escape, Diagnostic> {
    let mut digits: Vec<u32> = Vec::with_capacity(8);
    while digits.len() < 8 {
        match cursor.peek_nth(digits.len()).and_then(|c| c.to_digit(16)) {
            Some(digit) => digits.push(digit),
            None => break,
        }
    }

    let take = if digits.len() >= 8 {
        8
    } else if digits.len() >= 4 {
        4
    } else {
        return Err(Diagnostic::syntax(
            Span::new(start, cursor.offset()),
            "Invalid unicode escape",
        ));
    };

    let mut value: u32 = 0;
    for digit in digits.iter().take(take) {
        value = value * 16 + digit;
    }
    cursor.advance_bytes(take);

    match char::from_u32(value) {
        Some(decoded) => Ok(Escape::Char(decoded)),
        None => Err(Diagnostic::syntax(
            Span::new(start, cursor.offset()),
            "Invalid unicode escape",
        )),
    }
}
