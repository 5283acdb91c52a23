//! Main lexer implementation for Calyx.
//!
//! [`tokenize`] converts source text into a token sequence. Recognizers are
//! tried in a fixed priority order at each position: string literal,
//! comment, whitespace, float literal, integer literal, boolean literal,
//! identifier-or-keyword, control punctuation, bracket punctuation,
//! operator punctuation. The lexer is not fault-tolerant: the first
//! lexical error aborts the scan.

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::escape::{Escape, scan_escape};
use super::span::Span;
use super::token::{Token, TokenKind, is_keyword};
use crate::error::Diagnostic;

/// Multi-character operators, matched before single characters.
const COMPOUND_OPERATORS: &[&str] = &["<=", ">=", "==", "!=", "+=", "-=", "*=", "/=", "->"];

/// Single-character operators.
const SINGLE_OPERATORS: &[char] = &['+', '-', '*', '/', '$', '%', '^', '=', '&', '|', '!', '<', '>'];

/// Convert source text into a token sequence.
///
/// Fail-fast: on the first lexical error the scan stops and only the error
/// is returned; no partial token list is usable for recovery.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Lexer for Calyx source code.
struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Scan the next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, Diagnostic> {
        loop {
            self.skip_whitespace();

            if self.cursor.is_eof() {
                return Ok(None);
            }

            let start = self.cursor.offset();

            match self.cursor.peek().unwrap_or('\0') {
                '\'' | '"' => {
                    let quote = self.cursor.peek().unwrap_or('"');
                    return self.scan_quoted(quote, start).map(Some);
                }
                '`' if self.cursor.check_str("```") => {
                    return self.scan_raw(start).map(Some);
                }
                '/' if self.cursor.peek_nth(1) == Some('/') => {
                    self.skip_line_comment();
                }
                '/' if self.cursor.peek_nth(1) == Some('*') => {
                    self.skip_block_comment(start)?;
                }
                c if c.is_ascii_digit() || c == '.' => {
                    if let Some(len) = float_prefix_len(self.cursor.rest()) {
                        return self.scan_float(start, len).map(Some);
                    }
                    if c.is_ascii_digit() {
                        return self.scan_integer(start).map(Some);
                    }
                    // A lone '.' is control punctuation.
                    self.cursor.advance();
                    return Ok(Some(self.make(TokenKind::Control('.'), start)));
                }
                c if is_ident_start(c) => {
                    return Ok(Some(self.scan_identifier(start)));
                }
                c @ (',' | ';') => {
                    self.cursor.advance();
                    return Ok(Some(self.make(TokenKind::Control(c), start)));
                }
                c @ ('(' | ')' | '{' | '}' | '[' | ']') => {
                    self.cursor.advance();
                    return Ok(Some(self.make(TokenKind::Bracket(c), start)));
                }
                c => {
                    return self.scan_operator(c, start).map(Some);
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.cursor.check(|c| c.is_ascii_whitespace()) {
            self.cursor.advance();
        }
    }

    fn make(&self, kind: TokenKind, start: u32) -> Token {
        Token::new(kind, Span::new(start, self.cursor.offset()))
    }

    fn error_here(&self, start: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::syntax(Span::new(start, self.cursor.offset()), message)
    }

    // =========================================
    // Scanning: Comments
    // =========================================

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.cursor.peek() {
            if c == '\n' {
                break;
            }
            self.cursor.advance();
        }
    }

    /// Skip a `/* ... */` comment. A backslash escapes the following
    /// character, so `\*/` and an escaped newline do not terminate it.
    fn skip_block_comment(&mut self, start: u32) -> Result<(), Diagnostic> {
        self.cursor.advance_bytes(2); // "/*"

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(self.error_here(start, "Unterminated multiline comment"));
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('*') if self.cursor.peek_nth(1) == Some('/') => {
                    self.cursor.advance_bytes(2);
                    return Ok(());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Scanning: Strings
    // =========================================

    /// Scan a quoted string literal, decoding escapes as it goes.
    fn scan_quoted(&mut self, quote: char, start: u32) -> Result<Token, Diagnostic> {
        self.cursor.advance(); // opening quote

        let mut content = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(self.error_here(start, "Unterminated string literal"));
                }
                Some('\\') => {
                    self.cursor.advance();
                    match scan_escape(&mut self.cursor)? {
                        Escape::Char(c) => content.push(c),
                        Escape::LineContinuation => {}
                        Escape::Deferred => {
                            // The marker is consumed on the next character,
                            // which is kept literally.
                            if let Some(c) = self.cursor.advance() {
                                content.push(c);
                            }
                        }
                    }
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return Ok(self.make(TokenKind::Str(content), start));
                }
                Some(c) => {
                    self.cursor.advance();
                    content.push(c);
                }
            }
        }
    }

    /// Scan a triple-backtick raw string. Escaping is disabled and
    /// newlines are not fatal; only three consecutive backticks terminate.
    fn scan_raw(&mut self, start: u32) -> Result<Token, Diagnostic> {
        self.cursor.advance_bytes(3); // "```"

        let mut content = String::new();
        loop {
            if self.cursor.check_str("```") {
                self.cursor.advance_bytes(3);
                return Ok(self.make(TokenKind::Str(content), start));
            }
            match self.cursor.advance() {
                Some(c) => content.push(c),
                None => {
                    return Err(self.error_here(start, "Unterminated string literal"));
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    fn scan_float(&mut self, start: u32, len: usize) -> Result<Token, Diagnostic> {
        self.cursor.advance_bytes(len);
        let lexeme = self.cursor.slice_from(start);
        match lexeme.parse::<f64>() {
            Ok(value) => Ok(self.make(TokenKind::Float(value), start)),
            Err(_) => Err(self.error_here(start, "Invalid float literal")),
        }
    }

    fn scan_integer(&mut self, start: u32) -> Result<Token, Diagnostic> {
        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('b') => Some((2, "binary")),
                Some('o') => Some((8, "octal")),
                Some('x') => Some((16, "hexadecimal")),
                _ => None,
            };
            if let Some((radix, radix_name)) = radix {
                return self.scan_radix_integer(start, radix, radix_name);
            }
        }

        self.cursor.eat_while(|c| c.is_ascii_digit());
        let lexeme = self.cursor.slice_from(start);
        match lexeme.parse::<i32>() {
            Ok(value) => Ok(self.make(TokenKind::Integer(value), start)),
            Err(_) => Err(self.error_here(start, "Integer literal out of range")),
        }
    }

    /// Scan an integer with a `0b`/`0o`/`0x` radix prefix.
    fn scan_radix_integer(
        &mut self,
        start: u32,
        radix: u32,
        radix_name: &str,
    ) -> Result<Token, Diagnostic> {
        self.cursor.advance_bytes(2); // "0b" / "0o" / "0x"

        let digits = self.cursor.eat_while(|c| c.is_ascii_alphanumeric());
        if digits.is_empty() || digits.chars().any(|c| !c.is_digit(radix)) {
            return Err(self.error_here(
                start,
                format!("Invalid character in {radix_name} integer"),
            ));
        }

        match i32::from_str_radix(digits, radix) {
            Ok(value) => Ok(self.make(TokenKind::Integer(value), start)),
            Err(_) => Err(self.error_here(start, "Integer literal out of range")),
        }
    }

    // =========================================
    // Scanning: Identifiers, keywords, operators
    // =========================================

    fn scan_identifier(&mut self, start: u32) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice_from(start);

        // Keywords (including the boolean literals) are recognized by exact
        // match; anything else becomes an identifier.
        let kind = if is_keyword(lexeme) {
            TokenKind::Keyword(lexeme.to_string())
        } else {
            TokenKind::Identifier(lexeme.to_string())
        };
        self.make(kind, start)
    }

    fn scan_operator(&mut self, c: char, start: u32) -> Result<Token, Diagnostic> {
        for compound in COMPOUND_OPERATORS {
            if self.cursor.eat_str(compound) {
                return Ok(self.make(TokenKind::Operator(compound.to_string()), start));
            }
        }
        if SINGLE_OPERATORS.contains(&c) {
            self.cursor.advance();
            return Ok(self.make(TokenKind::Operator(c.to_string()), start));
        }

        self.cursor.advance();
        Err(self.error_here(start, "Invalid character"))
    }
}

/// Length of a float literal at the start of `rest`, if one is present.
///
/// Floats have a mandatory decimal point with optional digits on either
/// side, but at least one digit overall (`1.5`, `.5`, `2.`).
fn float_prefix_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i;
    if i >= bytes.len() || bytes[i] != b'.' {
        return None;
    }
    i += 1;
    let mut frac_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        frac_digits += 1;
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    Some(i)
}
