//! Diagnostic types shared by every pipeline phase.
//!
//! All phases are fail-fast: the first error is returned as a
//! [`Diagnostic`] and no later phase runs. The taxonomy is flat; each kind
//! carries a free-text message and a `[start, end)` byte-offset span.

use crate::lexer::Span;
use std::fmt;
use thiserror::Error;

/// The category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lexical and grammatical failures.
    Syntax,
    /// Undefined or redefined names.
    Identifier,
    /// Type-equality violations at declaration/call/assignment/operator
    /// boundaries.
    Type,
    /// Missing operator method on a type.
    Operation,
    /// Arity mismatches in function calls.
    Function,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Identifier => "IdentifierError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Operation => "OperationError",
            ErrorKind::Function => "FunctionError",
        };
        write!(f, "{name}")
    }
}

/// An error from any pipeline phase, with location and category.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct Diagnostic {
    /// The category of error that occurred.
    pub kind: ErrorKind,
    /// The location in source where the error occurred.
    pub span: Span,
    /// Human-readable error message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create a syntax error.
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, span, message)
    }

    /// Create an identifier error.
    pub fn identifier(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Identifier, span, message)
    }

    /// Create a type error.
    pub fn type_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, span, message)
    }

    /// Create an operation error.
    pub fn operation(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Operation, span, message)
    }

    /// Create a function error.
    pub fn function(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Function, span, message)
    }

    /// Format the diagnostic with source context for display.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();

        let (line, column) = self.span.line_col(source);

        output.push_str(&format!(
            "{} at {}:{}: {}\n",
            self.kind, line, column, self.message
        ));

        if let Some(line_text) = source.lines().nth(line as usize - 1) {
            output.push_str("  |\n");
            output.push_str(&format!("{line:>3} | {line_text}\n"));

            let indent = " ".repeat(column as usize - 1);
            let available = line_text.len().saturating_sub(column as usize - 1).max(1);
            let highlight = (self.span.len() as usize).clamp(1, available);
            let pointer = "^".to_string() + &"~".repeat(highlight - 1);
            output.push_str(&format!("  | {indent}{pointer}\n"));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_new() {
        let err = Diagnostic::new(ErrorKind::Syntax, Span::new(2, 7), "custom message");
        assert_eq!(err.span, Span::new(2, 7));
        assert_eq!(err.message, "custom message");
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ErrorKind::Syntax.to_string(), "SyntaxError");
        assert_eq!(ErrorKind::Identifier.to_string(), "IdentifierError");
        assert_eq!(ErrorKind::Type.to_string(), "TypeError");
        assert_eq!(ErrorKind::Operation.to_string(), "OperationError");
        assert_eq!(ErrorKind::Function.to_string(), "FunctionError");
    }

    #[test]
    fn display_trait() {
        let err = Diagnostic::type_error(Span::new(1, 4), "int and float");
        assert_eq!(err.to_string(), "TypeError at 1..4: int and float");
    }

    #[test]
    fn display_with_source_points_at_span() {
        let source = "x = 1;\ny == 2;";
        let err = Diagnostic::syntax(Span::new(9, 11), "test");
        let rendered = err.display_with_source(source);
        assert!(rendered.contains("2:3"));
        assert!(rendered.contains("y == 2;"));
        assert!(rendered.contains("^~"));
    }

    #[test]
    fn constructors_set_kind() {
        assert_eq!(
            Diagnostic::identifier(Span::point(0), "x").kind,
            ErrorKind::Identifier
        );
        assert_eq!(
            Diagnostic::operation(Span::point(0), "x").kind,
            ErrorKind::Operation
        );
        assert_eq!(
            Diagnostic::function(Span::point(0), "x").kind,
            ErrorKind::Function
        );
    }
}
