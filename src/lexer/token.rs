//! Token types and definitions for the Calyx lexer.

use super::span::Span;
use std::fmt;

/// A token from the source code.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// The kind of token, carrying its decoded payload.
    pub kind: TokenKind,
    /// Location in source.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Check whether this token matches a grammar pattern.
    ///
    /// See [`TokenKind::matches`] for the wildcard rule.
    #[inline]
    pub fn matches(&self, pattern: &TokenKind) -> bool {
        self.kind.matches(pattern)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// All possible token kinds in Calyx, each carrying its decoded payload.
///
/// String payloads hold the decoded content (escapes already expanded),
/// numeric payloads hold the parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal: `42`, `0b101`, `0o17`, `0x2A`
    Integer(i32),
    /// Float literal: `3.14`, `.5`, `2.`
    Float(f64),
    /// String literal: `'a'`, `"hello"`, ```` ```raw``` ````
    Str(String),
    /// User-defined identifier
    Identifier(String),
    /// Reserved keyword (including `true`/`false`)
    Keyword(String),
    /// Control punctuation: `.` `,` `;`
    Control(char),
    /// Bracket punctuation: `(` `)` `{` `}` `[` `]`
    Bracket(char),
    /// Operator punctuation: `+ - * / $ % ^ = & | !` and compounds
    Operator(String),
}

impl TokenKind {
    /// Check whether this token kind matches a grammar pattern.
    ///
    /// Patterns compare variant tag and payload, with one exception: an
    /// `Operator` pattern with an empty payload acts as a wildcard matching
    /// any operator token.
    pub fn matches(&self, pattern: &TokenKind) -> bool {
        match (self, pattern) {
            (TokenKind::Operator(_), TokenKind::Operator(p)) if p.is_empty() => true,
            _ => self == pattern,
        }
    }

    /// Check if this token kind is an operator.
    #[inline]
    pub fn is_operator(&self) -> bool {
        matches!(self, TokenKind::Operator(_))
    }

    /// Get the identifier payload, if this is an identifier token.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Get the string representation of this token kind for error messages.
    pub fn description(&self) -> String {
        match self {
            TokenKind::Integer(_) => "integer literal".to_string(),
            TokenKind::Float(_) => "float literal".to_string(),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Identifier(name) => format!("identifier '{name}'"),
            TokenKind::Keyword(kw) => format!("'{kw}'"),
            TokenKind::Control(c) => format!("'{c}'"),
            TokenKind::Bracket(c) => format!("'{c}'"),
            TokenKind::Operator(op) => {
                if op.is_empty() {
                    "operator".to_string()
                } else {
                    format!("'{op}'")
                }
            }
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// The fixed keyword set, checked by exact match after identifier scanning.
pub const KEYWORDS: &[&str] = &[
    "public", "static", "const", "if", "else", "switch", "case", "default", "for", "foreach",
    "in", "while", "return", "break", "continue", "class", "true", "false",
];

/// Check whether an identifier-shaped lexeme is a keyword.
pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert!(is_keyword("if"));
        assert!(is_keyword("foreach"));
        assert!(is_keyword("true"));
        assert!(!is_keyword("notakeyword"));
        assert!(!is_keyword("int"));
    }

    #[test]
    fn exact_match() {
        let token = Token::new(TokenKind::Control(';'), Span::new(3, 4));
        assert!(token.matches(&TokenKind::Control(';')));
        assert!(!token.matches(&TokenKind::Control(',')));
        assert!(!token.matches(&TokenKind::Bracket(';')));
    }

    #[test]
    fn operator_wildcard() {
        let token = Token::new(TokenKind::Operator("+=".to_string()), Span::new(0, 2));
        assert!(token.matches(&TokenKind::Operator(String::new())));
        assert!(token.matches(&TokenKind::Operator("+=".to_string())));
        assert!(!token.matches(&TokenKind::Operator("+".to_string())));
    }

    #[test]
    fn wildcard_only_matches_operators() {
        let token = Token::new(TokenKind::Identifier("x".to_string()), Span::new(0, 1));
        assert!(!token.matches(&TokenKind::Operator(String::new())));
    }

    #[test]
    fn payload_compared() {
        let a = TokenKind::Identifier("a".to_string());
        let b = TokenKind::Identifier("b".to_string());
        assert!(!a.matches(&b));
        assert!(a.matches(&TokenKind::Identifier("a".to_string())));
    }

    #[test]
    fn descriptions() {
        assert_eq!(TokenKind::Integer(42).description(), "integer literal");
        assert_eq!(
            TokenKind::Identifier("foo".to_string()).description(),
            "identifier 'foo'"
        );
        assert_eq!(TokenKind::Keyword("if".to_string()).description(), "'if'");
        assert_eq!(TokenKind::Operator("+".to_string()).description(), "'+'");
        assert_eq!(TokenKind::Operator(String::new()).description(), "operator");
        assert_eq!(TokenKind::Bracket('(').description(), "'('");
    }
}
