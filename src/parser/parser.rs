//! Hand-written parser for Calyx.
//!
//! A single mutually-recursive procedure over the token stream. Context
//! sensitivity comes from two axes: the current token and the kind of the
//! most recently emitted node. Sub-parses are bounded by [`StopRules`]
//! rather than per-context grammars, and the generic-type versus
//! less-than ambiguity is resolved by a speculative parse with cursor
//! rewind. The parser is fail-fast: the first structural error aborts.

use crate::ast::{Expansion, IfBranch, LiteralValue, Node, NodeKind, Qualifiers, SwitchCase};
use crate::error::Diagnostic;
use crate::lexer::{Span, Token, TokenKind};

use super::precedence::{precedence, splice};
use super::rules::StopRules;

/// Parse a token sequence into a top-level statement list.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, Diagnostic> {
    let mut parser = Parser::new(tokens);
    parser.parse_block(&StopRules::none())
}

/// Qualifier keywords in their only recognized order.
const QUALIFIER_ORDER: [(&str, Qualifiers); 3] = [
    ("public", Qualifiers::PUBLIC),
    ("static", Qualifiers::STATIC),
    ("const", Qualifiers::CONST),
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // =========================================
    // Token access
    // =========================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    /// The span of the upcoming token, or a point just past the last one.
    fn here(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::point(self.tokens.last().map_or(0, |t| t.span.end)),
        }
    }

    fn eat(&mut self, pattern: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.matches(pattern)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_operator(&mut self, op: &str) -> bool {
        if matches!(self.peek_kind(), Some(TokenKind::Operator(o)) if o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if k == kw)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, pattern: &TokenKind, message: &str) -> Result<Token, Diagnostic> {
        match self.peek() {
            Some(token) if token.matches(pattern) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(Diagnostic::syntax(self.here(), message)),
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<(String, Span), Diagnostic> {
        match self.peek() {
            Some(token) => match &token.kind {
                TokenKind::Identifier(name) => {
                    let out = (name.clone(), token.span);
                    self.pos += 1;
                    Ok(out)
                }
                _ => Err(Diagnostic::syntax(token.span, message)),
            },
            None => Err(Diagnostic::syntax(self.here(), message)),
        }
    }

    // =========================================
    // Main loop
    // =========================================

    /// Parse statements until a stop rule fires or input ends.
    fn parse_block(&mut self, rules: &StopRules) -> Result<Vec<Node>, Diagnostic> {
        let mut nodes: Vec<Node> = Vec::new();

        while let Some(token) = self.peek().cloned() {
            // A StatementEnd tail means the next token opens a fresh
            // statement.
            let started = nodes
                .last()
                .is_some_and(|n| n.kind != NodeKind::StatementEnd);

            if rules.should_stop(&token.kind, started) {
                break;
            }
            // Member access extends the current node and binds tighter
            // than the return-after-node rule.
            if started && token.kind == TokenKind::Control('.') {
                self.parse_member_access(&mut nodes, rules)?;
                continue;
            }
            if started && rules.return_on_node {
                break;
            }
            if started && token.kind.is_operator() {
                self.parse_operation(&mut nodes, rules, &token)?;
                continue;
            }

            self.parse_statement_start(&mut nodes, rules, token)?;
        }

        Ok(nodes)
    }

    fn parse_statement_start(
        &mut self,
        nodes: &mut Vec<Node>,
        rules: &StopRules,
        token: Token,
    ) -> Result<(), Diagnostic> {
        let span = token.span;
        match token.kind {
            TokenKind::Integer(value) => {
                self.pos += 1;
                nodes.push(Node::new(NodeKind::Literal(LiteralValue::Int(value)), span));
            }
            TokenKind::Float(value) => {
                self.pos += 1;
                nodes.push(Node::new(
                    NodeKind::Literal(LiteralValue::Float(value)),
                    span,
                ));
            }
            TokenKind::Str(value) => {
                self.pos += 1;
                nodes.push(Node::new(NodeKind::Literal(LiteralValue::Str(value)), span));
            }
            TokenKind::Keyword(kw) => self.parse_keyword(nodes, rules, &kw, span)?,
            TokenKind::Identifier(_) => {
                if matches!(
                    nodes.last().map(|n| &n.kind),
                    Some(NodeKind::GetVariable { .. } | NodeKind::TypeExpression { .. })
                ) {
                    self.parse_declaration(nodes, rules)?;
                } else {
                    let node = self.parse_identifier(rules)?;
                    nodes.push(node);
                }
            }
            TokenKind::Bracket('(') => {
                let node = self.parse_code_block(rules)?;
                nodes.push(node);
            }
            TokenKind::Bracket('{') => {
                self.pos += 1;
                let (body, close) = self.parse_braced_body(rules)?;
                nodes.push(Node::new(
                    NodeKind::CodeBlock {
                        parameters: Vec::new(),
                        return_type: None,
                        body,
                    },
                    span.merge(close),
                ));
            }
            TokenKind::Control(';') => {
                self.pos += 1;
                nodes.push(Node::new(NodeKind::StatementEnd, span));
            }
            TokenKind::Operator(op) if matches!(op.as_str(), "!" | "+" | "-") => {
                self.pos += 1;
                let operand = self.parse_operand(rules, span)?;
                let span = span.merge(operand.span);
                nodes.push(Node::new(
                    NodeKind::Operation {
                        operator: op,
                        left: None,
                        right: Box::new(operand),
                    },
                    span,
                ));
            }
            _ => return Err(Diagnostic::syntax(span, "Invalid statement start")),
        }
        Ok(())
    }

    // =========================================
    // Operators
    // =========================================

    /// Collect a run of `operator, operand` pairs onto the node that just
    /// finished, building one precedence-resolved tree.
    fn parse_operation(
        &mut self,
        nodes: &mut Vec<Node>,
        rules: &StopRules,
        trigger: &Token,
    ) -> Result<(), Diagnostic> {
        let Some(mut tree) = nodes.pop() else {
            return Err(Diagnostic::syntax(trigger.span, "Invalid statement start"));
        };

        loop {
            let Some(token) = self.peek().cloned() else {
                break;
            };
            let TokenKind::Operator(op) = token.kind else {
                break;
            };
            if precedence(&op).is_none() {
                return Err(Diagnostic::syntax(token.span, "Invalid operator"));
            }
            self.pos += 1;

            let operand = self.parse_operand(rules, token.span)?;
            tree = splice(tree, &op, operand);
        }

        nodes.push(tree);
        Ok(())
    }

    /// Parse exactly one operand; the following operator is left for the
    /// precedence loop above.
    fn parse_operand(&mut self, rules: &StopRules, op_span: Span) -> Result<Node, Diagnostic> {
        let sub_rules = rules.child(vec![TokenKind::Control(';')], true);
        let mut sub = self.parse_block(&sub_rules)?;
        match sub.pop() {
            Some(node) if sub.is_empty() && node.kind != NodeKind::StatementEnd => Ok(node),
            _ => Err(Diagnostic::syntax(
                op_span.merge(self.here()),
                "Missing right expression for operation",
            )),
        }
    }

    // =========================================
    // Identifiers, types, calls
    // =========================================

    fn parse_identifier(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let (name, span) = self.expect_identifier("Missing identifier")?;

        match self.peek_kind() {
            Some(TokenKind::Operator(op)) if op == "<" => {
                match self.try_parse_generic_type(&name, span)? {
                    Some(node) => Ok(node),
                    // Speculation abandoned: plain variable read, the `<`
                    // continues as a comparison.
                    None => Ok(Node::new(NodeKind::GetVariable { name }, span)),
                }
            }
            Some(TokenKind::Bracket('[')) if self.peek_nth_kind(1) == Some(&TokenKind::Bracket(']')) => {
                Ok(self.finish_array_type(name, span))
            }
            Some(TokenKind::Bracket('(')) => {
                self.pos += 1;
                let (arguments, close) = self.parse_argument_list(rules, span)?;
                Ok(Node::new(
                    NodeKind::FunctionCall { name, arguments },
                    span.merge(close),
                ))
            }
            _ => Ok(Node::new(NodeKind::GetVariable { name }, span)),
        }
    }

    fn finish_array_type(&mut self, name: String, span: Span) -> Node {
        let close = self.here();
        self.pos += 2; // "[]"
        Node::new(
            NodeKind::TypeExpression {
                name,
                generics: Vec::new(),
                is_array: true,
            },
            span.merge(close),
        )
    }

    /// Speculative parse of `name<...>` as a generic type.
    ///
    /// Returns `None` after rewinding the cursor when the token run is
    /// better read as a less-than comparison. A type element that is
    /// outright missing (nothing after `<` or a `,` at end of statement)
    /// is a hard error instead.
    fn try_parse_generic_type(
        &mut self,
        name: &str,
        name_span: Span,
    ) -> Result<Option<Node>, Diagnostic> {
        let snapshot = self.pos;
        self.pos += 1; // '<'

        let mut generics = Vec::new();
        loop {
            let element = match self.peek_kind() {
                Some(TokenKind::Identifier(_)) => match self.parse_type_element()? {
                    Some(element) => element,
                    None => {
                        self.pos = snapshot;
                        return Ok(None);
                    }
                },
                None | Some(TokenKind::Control(';')) => {
                    return Err(Diagnostic::syntax(
                        name_span.merge(self.here()),
                        "Missing end of type",
                    ));
                }
                _ => {
                    self.pos = snapshot;
                    return Ok(None);
                }
            };
            generics.push(element);

            match self.peek_kind() {
                Some(TokenKind::Operator(op)) if op == ">" => {
                    let close = self.here();
                    self.pos += 1;
                    let mut node = Node::new(
                        NodeKind::TypeExpression {
                            name: name.to_string(),
                            generics,
                            is_array: false,
                        },
                        name_span.merge(close),
                    );
                    if self.peek_kind() == Some(&TokenKind::Bracket('['))
                        && self.peek_nth_kind(1) == Some(&TokenKind::Bracket(']'))
                    {
                        let close = self.here();
                        self.pos += 2;
                        if let NodeKind::TypeExpression { is_array, .. } = &mut node.kind {
                            *is_array = true;
                        }
                        node.span = node.span.merge(close);
                    }
                    return Ok(Some(node));
                }
                Some(TokenKind::Control(',')) => {
                    self.pos += 1;
                }
                _ => {
                    self.pos = snapshot;
                    return Ok(None);
                }
            }
        }
    }

    /// One element of a generic argument list, itself possibly generic.
    fn parse_type_element(&mut self) -> Result<Option<Node>, Diagnostic> {
        let (name, span) = self.expect_identifier("Missing identifier")?;

        match self.peek_kind() {
            Some(TokenKind::Operator(op)) if op == "<" => self.try_parse_generic_type(&name, span),
            Some(TokenKind::Bracket('[')) if self.peek_nth_kind(1) == Some(&TokenKind::Bracket(']')) => {
                Ok(Some(self.finish_array_type(name, span)))
            }
            _ => Ok(Some(Node::new(
                NodeKind::TypeExpression {
                    name,
                    generics: Vec::new(),
                    is_array: false,
                },
                span,
            ))),
        }
    }

    /// A type reference in a position where one is required (parameter
    /// types, foreach bindings). Plain names come back as `GetVariable`
    /// and are resolved during interpretation.
    fn parse_type_ref(&mut self) -> Result<Node, Diagnostic> {
        let (name, span) = self.expect_identifier("Missing identifier")?;

        match self.peek_kind() {
            Some(TokenKind::Operator(op)) if op == "<" => {
                match self.try_parse_generic_type(&name, span)? {
                    Some(node) => Ok(node),
                    None => Ok(Node::new(NodeKind::GetVariable { name }, span)),
                }
            }
            Some(TokenKind::Bracket('[')) if self.peek_nth_kind(1) == Some(&TokenKind::Bracket(']')) => {
                Ok(self.finish_array_type(name, span))
            }
            _ => Ok(Node::new(NodeKind::GetVariable { name }, span)),
        }
    }

    /// Comma-separated argument sub-parses, consuming through `)`.
    fn parse_argument_list(
        &mut self,
        rules: &StopRules,
        open_span: Span,
    ) -> Result<(Vec<Node>, Span), Diagnostic> {
        let mut arguments = Vec::new();
        loop {
            match self.peek_kind() {
                None => {
                    return Err(Diagnostic::syntax(
                        open_span.merge(self.here()),
                        "Missing ending )",
                    ));
                }
                Some(TokenKind::Bracket(')')) => {
                    let close = self.here();
                    self.pos += 1;
                    return Ok((arguments, close));
                }
                _ => {}
            }

            let at = self.here();
            let arg_rules =
                rules.child(vec![TokenKind::Control(','), TokenKind::Bracket(')')], false);
            let mut sub = self.parse_block(&arg_rules)?;
            match sub.pop() {
                Some(node) if sub.is_empty() && node.kind != NodeKind::StatementEnd => {
                    arguments.push(node);
                }
                _ => return Err(Diagnostic::syntax(at.merge(self.here()), "Invalid expression")),
            }
            self.eat(&TokenKind::Control(','));
        }
    }

    // =========================================
    // Declarations and code blocks
    // =========================================

    /// An identifier right after a pending type head: a declaration, a
    /// declaration with initializer, or a function definition.
    fn parse_declaration(
        &mut self,
        nodes: &mut Vec<Node>,
        rules: &StopRules,
    ) -> Result<(), Diagnostic> {
        let (name, name_span) = self.expect_identifier("Missing identifier")?;

        // The type head is on the node stack; qualifiers may sit beneath.
        let ty = match nodes.last().map(|n| &n.kind) {
            Some(NodeKind::GetVariable { .. } | NodeKind::TypeExpression { .. }) => nodes.pop(),
            _ => None,
        };
        let (qualifiers, qualifier_span) = match nodes.last() {
            Some(node) => match node.kind {
                NodeKind::QualifierExpression { qualifiers } => {
                    let span = node.span;
                    nodes.pop();
                    (qualifiers, Some(span))
                }
                _ => (Qualifiers::empty(), None),
            },
            None => (Qualifiers::empty(), None),
        };
        let start = qualifier_span
            .or(ty.as_ref().map(|t| t.span))
            .unwrap_or(name_span);

        let node = match self.peek_kind() {
            // Function definition: the type head becomes the return type.
            Some(TokenKind::Bracket('(')) => {
                let open = self.here();
                self.pos += 1;
                let parameters = self.parse_parameter_list(rules, open)?;
                let block = self.finish_code_block(rules, open, parameters, ty.map(Box::new))?;
                let span = start.merge(block.span);
                Node::new(
                    NodeKind::DeclareVariable {
                        name,
                        ty: None,
                        qualifiers,
                        value: Some(Box::new(block)),
                    },
                    span,
                )
            }
            Some(TokenKind::Operator(op)) if op == "=" => {
                self.pos += 1;
                let value = self.expect_expression(rules, vec![TokenKind::Control(';')])?;
                let span = start.merge(value.span);
                Node::new(
                    NodeKind::DeclareVariable {
                        name,
                        ty: ty.map(Box::new),
                        qualifiers,
                        value: Some(Box::new(value)),
                    },
                    span,
                )
            }
            _ => Node::new(
                NodeKind::DeclareVariable {
                    name,
                    ty: ty.map(Box::new),
                    qualifiers,
                    value: None,
                },
                start.merge(name_span),
            ),
        };

        nodes.push(node);
        Ok(())
    }

    /// An anonymous code block opening with a parameter list:
    /// `(params) -> T { body }`.
    fn parse_code_block(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let open = self.here();
        self.pos += 1; // '('

        let parameters = self.parse_parameter_list(rules, open)?;
        let return_type = if self.eat_operator("->") {
            if !matches!(self.peek_kind(), Some(TokenKind::Identifier(_))) {
                return Err(Diagnostic::syntax(self.here(), "Missing return type"));
            }
            Some(Box::new(self.parse_type_ref()?))
        } else {
            None
        };

        self.finish_code_block(rules, open, parameters, return_type)
    }

    /// Shared tail of code-block forms: either `{ body }` or a bare `;`
    /// (left unconsumed) for an empty body.
    fn finish_code_block(
        &mut self,
        rules: &StopRules,
        start: Span,
        parameters: Vec<Node>,
        return_type: Option<Box<Node>>,
    ) -> Result<Node, Diagnostic> {
        let (body, end) = match self.peek_kind() {
            Some(TokenKind::Bracket('{')) => {
                self.pos += 1;
                self.parse_braced_body(rules)?
            }
            Some(TokenKind::Control(';')) => (Vec::new(), self.here()),
            _ => {
                return Err(Diagnostic::syntax(
                    start.merge(self.here()),
                    "Missing end of code block",
                ));
            }
        };

        Ok(Node::new(
            NodeKind::CodeBlock {
                parameters,
                return_type,
                body,
            },
            start.merge(end),
        ))
    }

    /// Statement list between `{` (already consumed) and `}`.
    fn parse_braced_body(&mut self, rules: &StopRules) -> Result<(Vec<Node>, Span), Diagnostic> {
        let body_rules = rules.child(vec![TokenKind::Bracket('}')], false);
        let body = self.parse_block(&body_rules)?;
        let close = self.expect(&TokenKind::Bracket('}'), "Missing end of code block")?;
        Ok((body, close.span))
    }

    fn parse_parameter_list(
        &mut self,
        rules: &StopRules,
        open_span: Span,
    ) -> Result<Vec<Node>, Diagnostic> {
        let mut parameters = Vec::new();
        loop {
            match self.peek_kind() {
                None => {
                    return Err(Diagnostic::syntax(
                        open_span.merge(self.here()),
                        "Missing ending )",
                    ));
                }
                Some(TokenKind::Bracket(')')) => {
                    self.pos += 1;
                    return Ok(parameters);
                }
                _ => {}
            }

            parameters.push(self.parse_parameter(rules)?);
            if !self.eat(&TokenKind::Control(',')) {
                self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
                return Ok(parameters);
            }
        }
    }

    fn parse_parameter(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();

        let expansion = if self.eat_operator("*") {
            if self.eat_operator("*") {
                Expansion::Double
            } else {
                Expansion::Single
            }
        } else {
            Expansion::None
        };

        let first = self.parse_type_ref()?;
        let (name, ty, mut end) = match self.peek_kind() {
            Some(TokenKind::Identifier(_)) => {
                let (name, span) = self.expect_identifier("Missing identifier")?;
                (name, Some(Box::new(first)), span)
            }
            _ => match first.kind {
                NodeKind::GetVariable { name } => (name, None, first.span),
                _ => return Err(Diagnostic::syntax(first.span, "Missing identifier")),
            },
        };

        let default = if self.eat_operator("=") {
            let value = self.expect_expression(
                rules,
                vec![TokenKind::Control(','), TokenKind::Bracket(')')],
            )?;
            end = value.span;
            Some(Box::new(value))
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::ParameterExpression {
                name,
                ty,
                default,
                expansion,
            },
            start.merge(end),
        ))
    }

    // =========================================
    // Keyword statements
    // =========================================

    fn parse_keyword(
        &mut self,
        nodes: &mut Vec<Node>,
        rules: &StopRules,
        kw: &str,
        span: Span,
    ) -> Result<(), Diagnostic> {
        match kw {
            "true" | "false" => {
                self.pos += 1;
                nodes.push(Node::new(
                    NodeKind::Literal(LiteralValue::Bool(kw == "true")),
                    span,
                ));
            }
            "if" => {
                let node = self.parse_if(rules)?;
                nodes.push(node);
            }
            "while" => {
                let node = self.parse_while(rules)?;
                nodes.push(node);
            }
            "for" => {
                let node = self.parse_for(rules)?;
                nodes.push(node);
            }
            "foreach" => {
                let node = self.parse_foreach(rules)?;
                nodes.push(node);
            }
            "switch" => {
                let node = self.parse_switch(rules)?;
                nodes.push(node);
            }
            "class" => self.parse_class(nodes, rules)?,
            "return" => {
                let node = self.parse_return(rules)?;
                nodes.push(node);
            }
            "break" => {
                self.pos += 1;
                nodes.push(Node::new(NodeKind::Break, span));
            }
            "continue" => {
                self.pos += 1;
                nodes.push(Node::new(NodeKind::Continue, span));
            }
            "public" | "static" | "const" => self.parse_qualifiers(nodes)?,
            _ => return Err(Diagnostic::syntax(span, "Invalid statement start")),
        }
        Ok(())
    }

    /// A consecutive qualifier run in canonical order, held as a single
    /// node until the declaration that consumes it.
    fn parse_qualifiers(&mut self, nodes: &mut Vec<Node>) -> Result<(), Diagnostic> {
        let start = self.here();
        let mut end = start;
        let mut qualifiers = Qualifiers::empty();
        let mut next_index = 0;

        loop {
            let Some(TokenKind::Keyword(kw)) = self.peek_kind() else {
                break;
            };
            let Some(position) = QUALIFIER_ORDER.iter().position(|(name, _)| *name == kw.as_str())
            else {
                break;
            };
            if position < next_index {
                return Err(Diagnostic::syntax(self.here(), "Invalid qualifier order"));
            }
            qualifiers |= QUALIFIER_ORDER[position].1;
            next_index = position + 1;
            end = self.here();
            self.pos += 1;
        }

        // A qualifier run is only meaningful before a declaration head.
        let followed = matches!(self.peek_kind(), Some(TokenKind::Identifier(_)))
            || self.peek_keyword("class");
        if !followed {
            return Err(Diagnostic::syntax(
                start.merge(self.here()),
                "Missing declaration after qualifiers",
            ));
        }

        nodes.push(Node::new(
            NodeKind::QualifierExpression { qualifiers },
            start.merge(end),
        ));
        Ok(())
    }

    fn parse_if(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'if'

        let mut branches = Vec::new();
        let mut else_body = None;
        let mut end;
        loop {
            self.expect(&TokenKind::Bracket('('), "Missing (")?;
            let condition = self.expect_expression(rules, vec![TokenKind::Bracket(')')])?;
            self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
            self.expect(&TokenKind::Bracket('{'), "Missing {")?;
            let (body, close) = self.parse_braced_body(rules)?;
            end = close;
            branches.push(IfBranch { condition, body });

            if self.eat_keyword("else") {
                if self.eat_keyword("if") {
                    continue;
                }
                self.expect(&TokenKind::Bracket('{'), "Missing {")?;
                let (body, close) = self.parse_braced_body(rules)?;
                end = close;
                else_body = Some(body);
            }
            break;
        }

        Ok(Node::new(
            NodeKind::IfStatement {
                branches,
                else_body,
            },
            start.merge(end),
        ))
    }

    fn parse_while(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'while'

        self.expect(&TokenKind::Bracket('('), "Missing (")?;
        let condition = self.expect_expression(rules, vec![TokenKind::Bracket(')')])?;
        self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
        self.expect(&TokenKind::Bracket('{'), "Missing {")?;
        let (body, close) = self.parse_braced_body(rules)?;

        Ok(Node::new(
            NodeKind::WhileLoop {
                condition: Box::new(condition),
                body,
            },
            start.merge(close),
        ))
    }

    fn parse_for(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'for'

        self.expect(&TokenKind::Bracket('('), "Missing (")?;
        let init = self.expect_expression(rules, vec![TokenKind::Control(';')])?;
        self.expect(&TokenKind::Control(';'), "Missing ending ;")?;
        let condition = self.expect_expression(rules, vec![TokenKind::Control(';')])?;
        self.expect(&TokenKind::Control(';'), "Missing ending ;")?;
        let step = self.expect_expression(rules, vec![TokenKind::Bracket(')')])?;
        self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
        self.expect(&TokenKind::Bracket('{'), "Missing {")?;
        let (body, close) = self.parse_braced_body(rules)?;

        Ok(Node::new(
            NodeKind::ForLoop {
                init: Box::new(init),
                condition: Box::new(condition),
                step: Box::new(step),
                body,
            },
            start.merge(close),
        ))
    }

    fn parse_foreach(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'foreach'

        self.expect(&TokenKind::Bracket('('), "Missing (")?;
        let ty = self.parse_type_ref()?;
        let (name, _) = self.expect_identifier("Missing identifier")?;
        if !self.eat_keyword("in") {
            return Err(Diagnostic::syntax(self.here(), "Missing 'in'"));
        }
        let iterable = self.expect_expression(rules, vec![TokenKind::Bracket(')')])?;
        self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
        self.expect(&TokenKind::Bracket('{'), "Missing {")?;
        let (body, close) = self.parse_braced_body(rules)?;

        Ok(Node::new(
            NodeKind::ForEachLoop {
                ty: Box::new(ty),
                name,
                iterable: Box::new(iterable),
                body,
            },
            start.merge(close),
        ))
    }

    fn parse_switch(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'switch'

        self.expect(&TokenKind::Bracket('('), "Missing (")?;
        let scrutinee = self.expect_expression(rules, vec![TokenKind::Bracket(')')])?;
        self.expect(&TokenKind::Bracket(')'), "Missing ending )")?;
        self.expect(&TokenKind::Bracket('{'), "Missing {")?;

        let mut cases = Vec::new();
        let mut default = None;
        let close;
        loop {
            match self.peek_kind() {
                None => {
                    return Err(Diagnostic::syntax(
                        start.merge(self.here()),
                        "Missing end of code block",
                    ));
                }
                Some(TokenKind::Bracket('}')) => {
                    close = self.here();
                    self.pos += 1;
                    break;
                }
                _ => {}
            }

            if self.eat_keyword("case") {
                let literal = self.parse_case_literal()?;
                self.expect(&TokenKind::Bracket('{'), "Missing {")?;
                let (body, _) = self.parse_braced_body(rules)?;
                cases.push(SwitchCase { literal, body });
            } else if self.eat_keyword("default") {
                if default.is_some() {
                    return Err(Diagnostic::syntax(self.here(), "Duplicate default case"));
                }
                self.expect(&TokenKind::Bracket('{'), "Missing {")?;
                let (body, _) = self.parse_braced_body(rules)?;
                default = Some(body);
            } else {
                return Err(Diagnostic::syntax(self.here(), "Invalid switch case"));
            }
        }

        Ok(Node::new(
            NodeKind::SwitchStatement {
                scrutinee: Box::new(scrutinee),
                cases,
                default,
            },
            start.merge(close),
        ))
    }

    fn parse_case_literal(&mut self) -> Result<Node, Diagnostic> {
        let span = self.here();
        let value = match self.peek_kind() {
            Some(TokenKind::Integer(v)) => LiteralValue::Int(*v),
            Some(TokenKind::Float(v)) => LiteralValue::Float(*v),
            Some(TokenKind::Str(v)) => LiteralValue::Str(v.clone()),
            Some(TokenKind::Keyword(kw)) if kw == "true" || kw == "false" => {
                LiteralValue::Bool(kw == "true")
            }
            _ => return Err(Diagnostic::syntax(span, "Missing case literal")),
        };
        self.pos += 1;
        Ok(Node::new(NodeKind::Literal(value), span))
    }

    fn parse_class(&mut self, nodes: &mut Vec<Node>, rules: &StopRules) -> Result<(), Diagnostic> {
        let kw_span = self.here();
        self.pos += 1; // 'class'

        let (qualifiers, start) = match nodes.last() {
            Some(node) => match node.kind {
                NodeKind::QualifierExpression { qualifiers } => {
                    let span = node.span;
                    nodes.pop();
                    (qualifiers, span)
                }
                _ => (Qualifiers::empty(), kw_span),
            },
            None => (Qualifiers::empty(), kw_span),
        };

        let (name, _) = self.expect_identifier("Missing identifier")?;
        self.expect(&TokenKind::Bracket('{'), "Missing {")?;
        let (body, close) = self.parse_braced_body(rules)?;

        nodes.push(Node::new(
            NodeKind::ClassDefinition {
                name,
                qualifiers,
                body,
            },
            start.merge(close),
        ));
        Ok(())
    }

    fn parse_return(&mut self, rules: &StopRules) -> Result<Node, Diagnostic> {
        let start = self.here();
        self.pos += 1; // 'return'

        let bare = match self.peek_kind() {
            None | Some(TokenKind::Control(';')) => true,
            Some(kind) => rules.should_stop(kind, false),
        };
        if bare {
            return Ok(Node::new(NodeKind::Return { value: None }, start));
        }

        let value = self.expect_expression(rules, vec![TokenKind::Control(';')])?;
        let span = start.merge(value.span);
        Ok(Node::new(
            NodeKind::Return {
                value: Some(Box::new(value)),
            },
            span,
        ))
    }

    /// A bounded sub-parse that must yield exactly one expression node.
    fn expect_expression(
        &mut self,
        rules: &StopRules,
        stops: Vec<TokenKind>,
    ) -> Result<Node, Diagnostic> {
        let at = self.here();
        let sub_rules = rules.child(stops, false);
        let mut sub = self.parse_block(&sub_rules)?;
        match sub.pop() {
            Some(node) if sub.is_empty() && node.kind != NodeKind::StatementEnd => Ok(node),
            _ => Err(Diagnostic::syntax(at.merge(self.here()), "Invalid expression")),
        }
    }

    // =========================================
    // Member access
    // =========================================

    fn parse_member_access(
        &mut self,
        nodes: &mut Vec<Node>,
        rules: &StopRules,
    ) -> Result<(), Diagnostic> {
        let dot = self.here();
        self.pos += 1; // '.'

        let Some(object) = nodes.pop() else {
            return Err(Diagnostic::syntax(dot, "Invalid statement start"));
        };
        let (member, member_span) = self.expect_identifier("Missing identifier")?;

        let (arguments, end) = if self.peek_kind() == Some(&TokenKind::Bracket('(')) {
            self.pos += 1;
            let (args, close) = self.parse_argument_list(rules, member_span)?;
            (Some(args), close)
        } else {
            (None, member_span)
        };

        let span = object.span.merge(end);
        nodes.push(Node::new(
            NodeKind::MemberAccess {
                object: Box::new(object),
                member,
                arguments,
            },
            span,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<Vec<Node>, Diagnostic> {
        parse(tokenize(source).unwrap())
    }

    fn parse_one(source: &str) -> Node {
        let mut nodes = parse_source(source).unwrap();
        nodes.retain(|n| n.kind != NodeKind::StatementEnd);
        assert_eq!(nodes.len(), 1, "expected one node from {source:?}");
        nodes.remove(0)
    }

    /// Render the expression shape for precedence assertions.
    fn shape(node: &Node) -> String {
        match &node.kind {
            NodeKind::GetVariable { name } => name.clone(),
            NodeKind::Literal(LiteralValue::Int(v)) => v.to_string(),
            NodeKind::Operation {
                operator,
                left: Some(l),
                right,
            } => format!("({} {} {})", shape(l), operator, shape(right)),
            NodeKind::Operation {
                operator,
                left: None,
                right,
            } => format!("({}{})", operator, shape(right)),
            other => format!("{other:?}"),
        }
    }

    #[test]
    fn precedence_shapes() {
        assert_eq!(shape(&parse_one("a + b * c;")), "(a + (b * c))");
        assert_eq!(shape(&parse_one("a * b + c;")), "((a * b) + c)");
        assert_eq!(shape(&parse_one("a == b * c + d;")), "(a == ((b * c) + d))");
        assert_eq!(shape(&parse_one("a ^ b ^ c;")), "((a ^ b) ^ c)");
        assert_eq!(shape(&parse_one("x = a | b & c;")), "(x = (a | (b & c)))");
    }

    #[test]
    fn unary_prefix() {
        assert_eq!(shape(&parse_one("-a;")), "(-a)");
        assert_eq!(shape(&parse_one("!a & b;")), "((!a) & b)");
        assert_eq!(shape(&parse_one("-a ^ b;")), "(-(a ^ b))");
        assert_eq!(shape(&parse_one("-a * b;")), "((-a) * b)");
    }

    #[test]
    fn missing_operand() {
        let err = parse_source("a + ;").unwrap_err();
        assert_eq!(err.message, "Missing right expression for operation");

        let err = parse_source("a *").unwrap_err();
        assert_eq!(err.message, "Missing right expression for operation");
    }

    #[test]
    fn generic_type_happy_path() {
        let node = parse_one("list<int>;");
        match node.kind {
            NodeKind::TypeExpression {
                name,
                generics,
                is_array,
            } => {
                assert_eq!(name, "list");
                assert_eq!(generics.len(), 1);
                assert!(!is_array);
            }
            other => panic!("expected type expression, got {other:?}"),
        }
    }

    #[test]
    fn nested_generic_type() {
        let node = parse_one("map<string, list<int>>;");
        match node.kind {
            NodeKind::TypeExpression { name, generics, .. } => {
                assert_eq!(name, "map");
                assert_eq!(generics.len(), 2);
                assert!(matches!(
                    &generics[1].kind,
                    NodeKind::TypeExpression { name, generics, .. }
                        if name == "list" && generics.len() == 1
                ));
            }
            other => panic!("expected type expression, got {other:?}"),
        }
    }

    #[test]
    fn generic_missing_element_is_hard_error() {
        let err = parse_source("list<").unwrap_err();
        assert_eq!(err.message, "Missing end of type");

        let err = parse_source("list<int,").unwrap_err();
        assert_eq!(err.message, "Missing end of type");
    }

    #[test]
    fn incomplete_generic_falls_back_to_comparison() {
        // `list<int` with no close rewinds to a less-than chain.
        let mut nodes = parse_source("list<int").unwrap();
        assert_eq!(nodes.len(), 1);
        let node = nodes.remove(0);
        assert!(matches!(
            node.kind,
            NodeKind::Operation { ref operator, left: Some(_), .. } if operator == "<"
        ));
    }

    #[test]
    fn array_type_marker() {
        let node = parse_one("int[];");
        assert!(matches!(
            node.kind,
            NodeKind::TypeExpression { ref name, is_array: true, .. } if name == "int"
        ));
    }

    #[test]
    fn declaration_without_initializer() {
        let node = parse_one("int x;");
        match node.kind {
            NodeKind::DeclareVariable {
                name, ty, value, ..
            } => {
                assert_eq!(name, "x");
                assert!(ty.is_some());
                assert!(value.is_none());
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn declaration_with_initializer() {
        let node = parse_one("int x = 1 + 2;");
        match node.kind {
            NodeKind::DeclareVariable { name, value, .. } => {
                assert_eq!(name, "x");
                assert_eq!(shape(value.as_deref().unwrap()), "(1 + 2)");
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn function_definition() {
        let node = parse_one("int add(int a, int b = 2) { return a + b; }");
        match node.kind {
            NodeKind::DeclareVariable {
                name, ty, value, ..
            } => {
                assert_eq!(name, "add");
                assert!(ty.is_none());
                match value.as_deref().map(|n| &n.kind) {
                    Some(NodeKind::CodeBlock {
                        parameters,
                        return_type,
                        body,
                    }) => {
                        assert_eq!(parameters.len(), 2);
                        assert!(return_type.is_some());
                        assert!(!body.is_empty());
                        assert!(matches!(
                            &parameters[1].kind,
                            NodeKind::ParameterExpression { default: Some(_), .. }
                        ));
                    }
                    other => panic!("expected code block value, got {other:?}"),
                }
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn expansion_parameters() {
        let node = parse_one("int f(*rest, **named) { return 0; }");
        let NodeKind::DeclareVariable { value: Some(value), .. } = node.kind else {
            panic!("expected declaration");
        };
        let NodeKind::CodeBlock { parameters, .. } = value.kind else {
            panic!("expected code block");
        };
        assert!(matches!(
            &parameters[0].kind,
            NodeKind::ParameterExpression { expansion: Expansion::Single, .. }
        ));
        assert!(matches!(
            &parameters[1].kind,
            NodeKind::ParameterExpression { expansion: Expansion::Double, .. }
        ));
    }

    #[test]
    fn anonymous_code_block_with_return_type() {
        let node = parse_one("(int a) -> int { return a; }");
        match node.kind {
            NodeKind::CodeBlock {
                parameters,
                return_type,
                ..
            } => {
                assert_eq!(parameters.len(), 1);
                assert!(return_type.is_some());
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn missing_return_type() {
        let err = parse_source("(int a) -> { return a; }").unwrap_err();
        assert_eq!(err.message, "Missing return type");
    }

    #[test]
    fn missing_code_block_end() {
        let err = parse_source("{ a;").unwrap_err();
        assert_eq!(err.message, "Missing end of code block");
    }

    #[test]
    fn missing_call_close() {
        let err = parse_source("f(1").unwrap_err();
        assert_eq!(err.message, "Missing ending )");
    }

    #[test]
    fn qualifiers_in_order() {
        let node = parse_one("public static const int x = 1;");
        match node.kind {
            NodeKind::DeclareVariable { qualifiers, .. } => {
                assert_eq!(
                    qualifiers,
                    Qualifiers::PUBLIC | Qualifiers::STATIC | Qualifiers::CONST
                );
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn qualifiers_out_of_order() {
        let err = parse_source("static public int x = 1;").unwrap_err();
        assert_eq!(err.message, "Invalid qualifier order");
    }

    #[test]
    fn qualifiers_need_a_declaration() {
        let err = parse_source("public;").unwrap_err();
        assert_eq!(err.message, "Missing declaration after qualifiers");
    }

    #[test]
    fn if_else_chain() {
        let node = parse_one("if (a) { 1; } else if (b) { 2; } else { 3; }");
        match node.kind {
            NodeKind::IfStatement {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn while_loop() {
        let node = parse_one("while (a < 10) { a += 1; }");
        assert!(matches!(node.kind, NodeKind::WhileLoop { .. }));
    }

    #[test]
    fn for_loop() {
        let node = parse_one("for (int i = 0; i < 10; i += 1) { f(i); }");
        match node.kind {
            NodeKind::ForLoop { init, .. } => {
                assert!(matches!(init.kind, NodeKind::DeclareVariable { .. }));
            }
            other => panic!("expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn foreach_loop() {
        let node = parse_one("foreach (string c in name) { f(c); }");
        match node.kind {
            NodeKind::ForEachLoop { name, .. } => assert_eq!(name, "c"),
            other => panic!("expected foreach loop, got {other:?}"),
        }
    }

    #[test]
    fn switch_statement() {
        let node = parse_one("switch (x) { case 1 { a(); } case 2 { b(); } default { c(); } }");
        match node.kind {
            NodeKind::SwitchStatement { cases, default, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(default.is_some());
            }
            other => panic!("expected switch, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_default_case() {
        let err = parse_source("switch (x) { default { } default { } }").unwrap_err();
        assert_eq!(err.message, "Duplicate default case");
    }

    #[test]
    fn class_definition() {
        let node = parse_one("public class Point { int x; int y; }");
        match node.kind {
            NodeKind::ClassDefinition {
                name, qualifiers, ..
            } => {
                assert_eq!(name, "Point");
                assert!(qualifiers.contains(Qualifiers::PUBLIC));
            }
            other => panic!("expected class definition, got {other:?}"),
        }
    }

    #[test]
    fn member_access() {
        let node = parse_one("a.b;");
        assert!(matches!(
            node.kind,
            NodeKind::MemberAccess { arguments: None, .. }
        ));

        let node = parse_one("a.b(1, 2);");
        match node.kind {
            NodeKind::MemberAccess { arguments, .. } => {
                assert_eq!(arguments.map(|a| a.len()), Some(2));
            }
            other => panic!("expected member access, got {other:?}"),
        }
    }

    #[test]
    fn member_access_binds_tighter_than_operators() {
        let node = parse_one("1 + a.b;");
        let NodeKind::Operation { right, .. } = node.kind else {
            panic!("expected operation");
        };
        assert!(matches!(right.kind, NodeKind::MemberAccess { .. }));
    }

    #[test]
    fn bare_and_valued_return() {
        let node = parse_one("return;");
        assert!(matches!(node.kind, NodeKind::Return { value: None }));

        let node = parse_one("return a + 1;");
        assert!(matches!(node.kind, NodeKind::Return { value: Some(_) }));
    }

    #[test]
    fn invalid_statement_start() {
        let err = parse_source(")").unwrap_err();
        assert_eq!(err.message, "Invalid statement start");
    }

    #[test]
    fn statement_end_markers_survive_parsing() {
        let nodes = parse_source("a; b;").unwrap();
        let tags: Vec<&str> = nodes.iter().map(|n| n.tag()).collect();
        assert_eq!(
            tags,
            vec!["GetVariable", "StatementEnd", "GetVariable", "StatementEnd"]
        );
    }

    #[test]
    fn semicolon_terminates_nested_subexpression() {
        // The inherited `;` rule ends the argument sub-parse; the missing
        // `)` is then reported by the call parser.
        let err = parse_source("f(a; b)").unwrap_err();
        assert_eq!(err.message, "Invalid expression");
    }
}
