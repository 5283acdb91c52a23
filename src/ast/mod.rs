//! AST node model shared by the parser, checker and interpreter.
//!
//! Nodes are a closed tagged variant; children are owned by their parent
//! so the tree has no sharing and no cycles. Every node carries a
//! `[start, end)` byte-offset span for diagnostics.

use crate::lexer::Span;
use bitflags::bitflags;

/// An AST node: a kind plus its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    /// Create a new node.
    #[inline]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The string tag of this node's kind, used in diagnostics and for
    /// ancestor bookkeeping during semantic checking.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::TypeExpression { .. } => "TypeExpression",
            NodeKind::ParameterExpression { .. } => "ParameterExpression",
            NodeKind::QualifierExpression { .. } => "QualifierExpression",
            NodeKind::Literal(_) => "Literal",
            NodeKind::CodeBlock { .. } => "CodeBlock",
            NodeKind::Operation { .. } => "Operation",
            NodeKind::GetVariable { .. } => "GetVariable",
            NodeKind::DeclareVariable { .. } => "DeclareVariable",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::ClassDefinition { .. } => "ClassDefinition",
            NodeKind::MemberAccess { .. } => "MemberAccess",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::ForLoop { .. } => "ForLoop",
            NodeKind::ForEachLoop { .. } => "ForEachLoop",
            NodeKind::WhileLoop { .. } => "WhileLoop",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::StatementEnd => "StatementEnd",
        }
    }

    /// Whether this node ends its own statement, so no trailing `;` is
    /// required after it.
    pub fn is_self_terminating(&self) -> bool {
        match &self.kind {
            NodeKind::ClassDefinition { .. }
            | NodeKind::IfStatement { .. }
            | NodeKind::SwitchStatement { .. }
            | NodeKind::ForLoop { .. }
            | NodeKind::ForEachLoop { .. }
            | NodeKind::WhileLoop { .. }
            | NodeKind::CodeBlock { .. } => true,
            // A function definition ends at the closing brace of its body.
            NodeKind::DeclareVariable {
                value: Some(value), ..
            } => matches!(value.kind, NodeKind::CodeBlock { .. }),
            _ => false,
        }
    }

    /// Whether this node is a loop construct.
    pub fn is_loop(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::ForLoop { .. } | NodeKind::ForEachLoop { .. } | NodeKind::WhileLoop { .. }
        )
    }
}

/// A literal value carried by a [`NodeKind::Literal`] node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i32),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Argument-expansion marker on a declared parameter.
///
/// `*name` and `**name` parse but are not yet bound at call time; the
/// interpreter reports them as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    None,
    /// `*name`
    Single,
    /// `**name`
    Double,
}

bitflags! {
    /// Declaration modifiers. Recognized only in the canonical order
    /// `public static const`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Qualifiers: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        const CONST = 1 << 2;
    }
}

/// One `condition { body }` arm of an if/else-if chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: Node,
    pub body: Vec<Node>,
}

/// One `case <literal> { body }` arm of a switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub literal: Node,
    pub body: Vec<Node>,
}

/// All possible AST node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A type name with optional generic arguments and array marker:
    /// `int`, `list<int>`, `int[]`
    TypeExpression {
        name: String,
        generics: Vec<Node>,
        is_array: bool,
    },
    /// A declared parameter: `int x`, `int x = 1`, `*rest`, `**named`
    ParameterExpression {
        name: String,
        ty: Option<Box<Node>>,
        default: Option<Box<Node>>,
        expansion: Expansion,
    },
    /// Accumulated declaration modifiers awaiting the declaration that
    /// consumes them.
    QualifierExpression { qualifiers: Qualifiers },
    /// A literal value.
    Literal(LiteralValue),
    /// A function body: declared parameters, optional return type, and a
    /// statement list. Anonymous blocks have no parameters or return type.
    CodeBlock {
        parameters: Vec<Node>,
        return_type: Option<Box<Node>>,
        body: Vec<Node>,
    },
    /// An operator application. `left` is absent for unary prefix
    /// operators.
    Operation {
        operator: String,
        left: Option<Box<Node>>,
        right: Box<Node>,
    },
    /// A variable read.
    GetVariable { name: String },
    /// A variable declaration, with or without an initializer. Function
    /// definitions also lower to this form with a `CodeBlock` value.
    DeclareVariable {
        name: String,
        ty: Option<Box<Node>>,
        qualifiers: Qualifiers,
        value: Option<Box<Node>>,
    },
    /// A call to a named function.
    FunctionCall { name: String, arguments: Vec<Node> },
    /// A class body. Surface syntax only; evaluation is unimplemented.
    ClassDefinition {
        name: String,
        qualifiers: Qualifiers,
        body: Vec<Node>,
    },
    /// `object.member` or `object.member(arguments)`
    MemberAccess {
        object: Box<Node>,
        member: String,
        arguments: Option<Vec<Node>>,
    },
    /// An if/else-if/else chain. `branches` is never empty.
    IfStatement {
        branches: Vec<IfBranch>,
        else_body: Option<Vec<Node>>,
    },
    /// A switch over literal cases with an optional default arm.
    SwitchStatement {
        scrutinee: Box<Node>,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Node>>,
    },
    /// `for (init; condition; step) { body }`
    ForLoop {
        init: Box<Node>,
        condition: Box<Node>,
        step: Box<Node>,
        body: Vec<Node>,
    },
    /// `foreach (Type name in iterable) { body }`
    ForEachLoop {
        ty: Box<Node>,
        name: String,
        iterable: Box<Node>,
        body: Vec<Node>,
    },
    /// `while (condition) { body }`
    WhileLoop { condition: Box<Node>, body: Vec<Node> },
    /// `return;` or `return expression;`
    Return { value: Option<Box<Node>> },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// A `;` marker. Consumed and discarded by the semantic pass.
    StatementEnd,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind) -> Node {
        Node::new(kind, Span::point(0))
    }

    #[test]
    fn tags() {
        assert_eq!(node(NodeKind::Break).tag(), "Break");
        assert_eq!(
            node(NodeKind::GetVariable {
                name: "x".to_string()
            })
            .tag(),
            "GetVariable"
        );
        assert_eq!(node(NodeKind::StatementEnd).tag(), "StatementEnd");
    }

    #[test]
    fn self_terminating_constructs() {
        let loop_node = node(NodeKind::WhileLoop {
            condition: Box::new(node(NodeKind::Literal(LiteralValue::Bool(true)))),
            body: vec![],
        });
        assert!(loop_node.is_self_terminating());
        assert!(loop_node.is_loop());

        let literal = node(NodeKind::Literal(LiteralValue::Int(1)));
        assert!(!literal.is_self_terminating());
        assert!(!literal.is_loop());
    }

    #[test]
    fn qualifier_flags() {
        let q = Qualifiers::PUBLIC | Qualifiers::CONST;
        assert!(q.contains(Qualifiers::PUBLIC));
        assert!(!q.contains(Qualifiers::STATIC));
    }
}
