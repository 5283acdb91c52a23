//! Syntax analysis for Calyx.
//!
//! Turns the lexer's token stream into an AST statement list. See
//! [`parser`] for the dispatch loop, [`precedence`] for operator tree
//! construction and [`rules`] for sub-parse bounding.

#[allow(clippy::module_inception)]
mod parser;
mod precedence;
mod rules;

pub use parser::parse;
pub use precedence::precedence;
pub use rules::{StopRule, StopRules};
