//! A small expression language: lexer, backtracking parser, semantic
//! checker, and a tree-walking interpreter with method-table operator
//! dispatch.
//!
//! The pipeline is fail-fast; each stage returns the first
//! [`Diagnostic`] it hits:
//!
//! ```
//! use calyx::{bootstrap, check, interpret, parse, tokenize};
//!
//! let env = bootstrap();
//! let nodes = check(parse(tokenize("3 + 4;").unwrap()).unwrap()).unwrap();
//! let (result, _) = interpret(&nodes, &env).unwrap();
//! # let _ = result;
//! ```
//!
//! [`eval`] runs the whole pipeline in one call.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use error::{Diagnostic, ErrorKind};
pub use interpreter::{EnvRef, Object, ReturnReason, bootstrap, interpret};
pub use lexer::{Span, Token, TokenKind, tokenize};
pub use parser::parse;
pub use semantic::check;

/// Tokenize, parse, check, and interpret `source` against `env`.
pub fn eval(source: &str, env: &EnvRef) -> Result<(Object, ReturnReason), Diagnostic> {
    let nodes = check(parse(tokenize(source)?)?)?;
    interpret(&nodes, env)
}

pub mod prelude {
    pub use crate::ast::{Node, NodeKind};
    pub use crate::error::{Diagnostic, ErrorKind};
    pub use crate::interpreter::{EnvRef, Object, ReturnReason, Value, bootstrap, interpret};
    pub use crate::lexer::{Span, Token, TokenKind, tokenize};
    pub use crate::parser::parse;
    pub use crate::semantic::check;
    pub use crate::eval;
}
