//! Lexical analysis for Calyx source code.
//!
//! Converts raw source text into a token stream via [`tokenize`]. Tokens
//! carry decoded payloads (parsed numbers, escape-expanded strings) and
//! `[start, end)` byte-offset spans back into the source.

mod cursor;
mod escape;
#[allow(clippy::module_inception)]
mod lexer;
mod span;
mod token;

pub use lexer::tokenize;
pub use span::Span;
pub use token::{KEYWORDS, Token, TokenKind, is_keyword};
