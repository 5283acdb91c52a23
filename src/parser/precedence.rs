//! Operator precedence resolution.
//!
//! The parser collects a flat run of `operator, operand` pairs and calls
//! [`splice`] once per pair to grow a single correctly-associated
//! expression tree. A looser operator wraps the whole tree built so far;
//! a tighter one is spliced onto the rightmost spine. Equal precedence
//! wraps, giving left associativity. Unary (left-absent) operations are
//! atomic to the algorithm, with one exception: `^` binds inside a unary
//! prefix operand, so `-a ^ b` reads as `-(a ^ b)`.

use crate::ast::{Node, NodeKind};

/// Binding strength of a binary operator, tighter operators higher.
/// `None` for symbols that cannot appear in infix position.
pub fn precedence(operator: &str) -> Option<u8> {
    match operator {
        "^" => Some(7),
        "*" | "/" | "$" | "%" => Some(6),
        "+" | "-" => Some(5),
        "<" | ">" | "<=" | ">=" | "==" | "!=" => Some(4),
        "&" => Some(3),
        "|" => Some(2),
        "=" | "+=" | "-=" | "*=" | "/=" => Some(1),
        _ => None,
    }
}

/// Attach one `operator, operand` pair to the tree built so far.
///
/// `operator` must have a precedence (checked by the caller).
pub fn splice(tree: Node, operator: &str, operand: Node) -> Node {
    let span = tree.span.merge(operand.span);

    match tree.kind {
        // Pow reaches inside a unary prefix operand.
        NodeKind::Operation {
            operator: unary,
            left: None,
            right,
        } if operator == "^" => {
            let inner_span = right.span.merge(operand.span);
            let inner = Node::new(
                NodeKind::Operation {
                    operator: operator.to_string(),
                    left: Some(right),
                    right: Box::new(operand),
                },
                inner_span,
            );
            Node::new(
                NodeKind::Operation {
                    operator: unary,
                    left: None,
                    right: Box::new(inner),
                },
                span,
            )
        }
        // Tighter than the node at this spine position: descend right.
        NodeKind::Operation {
            operator: top,
            left: Some(left),
            right,
        } if binds_tighter(operator, &top) => {
            let right = splice(*right, operator, operand);
            let span = left.span.merge(right.span);
            Node::new(
                NodeKind::Operation {
                    operator: top,
                    left: Some(left),
                    right: Box::new(right),
                },
                span,
            )
        }
        // Same or looser: wrap the whole tree as the new left operand.
        kind => Node::new(
            NodeKind::Operation {
                operator: operator.to_string(),
                left: Some(Box::new(Node::new(kind, tree.span))),
                right: Box::new(operand),
            },
            span,
        ),
    }
}

fn binds_tighter(new: &str, existing: &str) -> bool {
    match (precedence(new), precedence(existing)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}
