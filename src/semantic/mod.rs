//! Structural legality checking and normalization.
//!
//! Two passes over every statement list, applied recursively to nested
//! bodies. The terminator pass requires each statement to end in a `;`
//! marker or be a self-terminating construct, then strips the markers.
//! The structural pass walks the tree with a stack of enclosing construct
//! tags, enforcing where return/break/continue and declaration-like nodes
//! may appear. Fail-fast: the first violation aborts the check.

use crate::ast::{Node, NodeKind};
use crate::error::Diagnostic;
use crate::lexer::Span;

/// Check a parsed statement list, returning it with `StatementEnd`
/// markers removed from every nesting level.
pub fn check(mut nodes: Vec<Node>) -> Result<Vec<Node>, Diagnostic> {
    let mut checker = Checker {
        ancestors: Vec::new(),
    };
    checker.check_body(&mut nodes)?;
    Ok(nodes)
}

struct Checker {
    /// Tags of enclosing constructs, outermost first.
    ancestors: Vec<&'static str>,
}

impl Checker {
    /// Terminator pass then structural pass over one statement list.
    fn check_body(&mut self, nodes: &mut Vec<Node>) -> Result<(), Diagnostic> {
        for (i, node) in nodes.iter().enumerate() {
            if node.kind == NodeKind::StatementEnd {
                continue;
            }
            let followed = matches!(
                nodes.get(i + 1).map(|n| &n.kind),
                Some(NodeKind::StatementEnd)
            );
            if !node.is_self_terminating() && !followed {
                return Err(Diagnostic::syntax(node.span, "Missing ending ;"));
            }
        }
        nodes.retain(|n| n.kind != NodeKind::StatementEnd);

        for node in nodes.iter_mut() {
            self.check_statement(node)?;
        }
        Ok(())
    }

    /// Statement position: control flow, declarations and calls are all
    /// legal here.
    fn check_statement(&mut self, node: &mut Node) -> Result<(), Diagnostic> {
        let span = node.span;
        match &mut node.kind {
            // These only exist as children of the construct that parsed
            // them.
            NodeKind::ParameterExpression { .. }
            | NodeKind::QualifierExpression { .. }
            | NodeKind::StatementEnd => Err(Diagnostic::syntax(span, "Invalid expression")),

            NodeKind::Literal(_)
            | NodeKind::GetVariable { .. }
            | NodeKind::TypeExpression { .. } => Ok(()),

            NodeKind::Operation { left, right, .. } => {
                if let Some(left) = left {
                    self.check_expression(left)?;
                }
                self.check_expression(right)
            }
            NodeKind::FunctionCall { arguments, .. } => {
                self.ancestors.push("FunctionCall");
                for argument in arguments.iter_mut() {
                    self.check_expression(argument)?;
                }
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::MemberAccess {
                object, arguments, ..
            } => {
                self.check_expression(object)?;
                if let Some(arguments) = arguments {
                    for argument in arguments.iter_mut() {
                        self.check_expression(argument)?;
                    }
                }
                Ok(())
            }
            NodeKind::CodeBlock {
                parameters, body, ..
            } => {
                for parameter in parameters.iter_mut() {
                    if let NodeKind::ParameterExpression {
                        default: Some(default),
                        ..
                    } = &mut parameter.kind
                    {
                        self.check_expression(default)?;
                    }
                }
                self.ancestors.push("CodeBlock");
                self.check_body(body)?;
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::DeclareVariable { value, .. } => {
                if let Some(value) = value {
                    self.check_expression(value)?;
                }
                Ok(())
            }
            NodeKind::ClassDefinition { body, .. } => {
                self.ancestors.push("ClassDefinition");
                self.check_body(body)?;
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::IfStatement {
                branches,
                else_body,
            } => {
                self.ancestors.push("IfStatement");
                for branch in branches.iter_mut() {
                    self.check_expression(&mut branch.condition)?;
                    self.check_body(&mut branch.body)?;
                }
                if let Some(body) = else_body {
                    self.check_body(body)?;
                }
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::SwitchStatement {
                scrutinee,
                cases,
                default,
            } => {
                self.ancestors.push("SwitchStatement");
                self.check_expression(scrutinee)?;
                for case in cases.iter_mut() {
                    self.check_body(&mut case.body)?;
                }
                if let Some(body) = default {
                    self.check_body(body)?;
                }
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::ForLoop {
                init,
                condition,
                step,
                body,
            } => {
                self.ancestors.push("ForLoop");
                self.check_statement(init)?;
                self.check_expression(condition)?;
                self.check_statement(step)?;
                self.check_body(body)?;
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::ForEachLoop { iterable, body, .. } => {
                self.ancestors.push("ForEachLoop");
                self.check_expression(iterable)?;
                self.check_body(body)?;
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::WhileLoop { condition, body } => {
                self.ancestors.push("WhileLoop");
                self.check_expression(condition)?;
                self.check_body(body)?;
                self.ancestors.pop();
                Ok(())
            }
            NodeKind::Return { value } => {
                if !self.ancestors.iter().any(|t| *t == "CodeBlock") {
                    return Err(Diagnostic::syntax(span, "Return outside function"));
                }
                if let Some(value) = value {
                    self.check_expression(value)?;
                }
                Ok(())
            }
            NodeKind::Break => self.check_loop_escape(span, "Break"),
            NodeKind::Continue => self.check_loop_escape(span, "Continue"),
        }
    }

    /// Expression position: control flow and declarations are rejected on
    /// top of the statement-position rules.
    fn check_expression(&mut self, node: &mut Node) -> Result<(), Diagnostic> {
        match &node.kind {
            NodeKind::DeclareVariable { .. }
            | NodeKind::ClassDefinition { .. }
            | NodeKind::IfStatement { .. }
            | NodeKind::SwitchStatement { .. }
            | NodeKind::ForLoop { .. }
            | NodeKind::ForEachLoop { .. }
            | NodeKind::WhileLoop { .. }
            | NodeKind::Return { .. }
            | NodeKind::Break
            | NodeKind::Continue => Err(Diagnostic::syntax(node.span, "Invalid expression")),
            _ => self.check_statement(node),
        }
    }

    /// Break/continue need a loop ancestor, and that loop must not sit on
    /// the far side of a function boundary.
    fn check_loop_escape(&self, span: Span, what: &str) -> Result<(), Diagnostic> {
        let loop_index = self
            .ancestors
            .iter()
            .rposition(|t| matches!(*t, "ForLoop" | "ForEachLoop" | "WhileLoop"));
        let Some(loop_index) = loop_index else {
            return Err(Diagnostic::syntax(span, format!("{what} outside loop")));
        };

        let boundary = self
            .ancestors
            .iter()
            .rposition(|t| matches!(*t, "FunctionCall" | "CodeBlock"));
        if boundary.is_some_and(|b| b > loop_index) {
            return Err(Diagnostic::syntax(span, format!("{what} outside loop")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Qualifiers;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check_source(source: &str) -> Result<Vec<Node>, Diagnostic> {
        check(parse(tokenize(source).unwrap()).unwrap())
    }

    #[test]
    fn markers_are_stripped() {
        let nodes = check_source("a; b;").unwrap();
        let tags: Vec<&str> = nodes.iter().map(|n| n.tag()).collect();
        assert_eq!(tags, vec!["GetVariable", "GetVariable"]);
    }

    #[test]
    fn missing_terminator() {
        let err = check_source("a").unwrap_err();
        assert_eq!(err.message, "Missing ending ;");

        let err = check_source("a; b").unwrap_err();
        assert_eq!(err.message, "Missing ending ;");
    }

    #[test]
    fn self_terminating_constructs_need_no_semicolon() {
        assert!(check_source("while (a) { b; }").is_ok());
        assert!(check_source("if (a) { b; }").is_ok());
        assert!(check_source("class C { int x; }").is_ok());
    }

    #[test]
    fn terminator_pass_recurses_into_bodies() {
        let err = check_source("while (a) { b }").unwrap_err();
        assert_eq!(err.message, "Missing ending ;");
    }

    #[test]
    fn break_and_continue_placement() {
        let err = check_source("break;").unwrap_err();
        assert_eq!(err.message, "Break outside loop");

        let err = check_source("continue;").unwrap_err();
        assert_eq!(err.message, "Continue outside loop");

        assert!(check_source("while (a) { break; }").is_ok());
        assert!(check_source("for (int i = 0; i < 3; i += 1) { continue; }").is_ok());
    }

    #[test]
    fn break_cannot_cross_function_boundary() {
        // The nearest loop sits outside the function body, so the break is
        // rejected.
        let err = check_source("while (a) { int f() { break; } }").unwrap_err();
        assert_eq!(err.message, "Break outside loop");

        // A loop inside the function body is fine.
        assert!(check_source("int f() { while (a) { break; } }").is_ok());
    }

    #[test]
    fn return_needs_enclosing_function() {
        let err = check_source("return 1;").unwrap_err();
        assert_eq!(err.message, "Return outside function");

        assert!(check_source("int f() { return 1; }").is_ok());
    }

    #[test]
    fn control_flow_rejected_in_expression_position() {
        let err = check_source("x = while (a) { b; };").unwrap_err();
        assert_eq!(err.message, "Invalid expression");
    }

    #[test]
    fn free_standing_qualifier_node_rejected() {
        let nodes = vec![
            Node::new(
                NodeKind::QualifierExpression {
                    qualifiers: Qualifiers::PUBLIC,
                },
                Span::new(0, 6),
            ),
            Node::new(NodeKind::StatementEnd, Span::point(6)),
        ];
        let err = check(nodes).unwrap_err();
        assert_eq!(err.message, "Invalid expression");
    }

    #[test]
    fn empty_list_is_fine() {
        assert!(check(Vec::new()).unwrap().is_empty());
    }
}
