//! Stop rules bounding recursive sub-parses.
//!
//! A sub-parse (inside parentheses, generic angle brackets, braces) is
//! bounded by the token patterns in its [`StopRules`] rather than by a
//! separate grammar per context. A rule never consumes its trigger token;
//! the initiating context does. Rules from an enclosing call are carried
//! into nested calls re-marked as inherited, so a `;` that terminates an
//! enclosing statement also terminates any unterminated sub-expression
//! parse beneath it.

use crate::lexer::TokenKind;

/// A single stop trigger.
#[derive(Debug, Clone)]
pub struct StopRule {
    /// Pattern matched against the upcoming token. An `Operator` pattern
    /// with an empty payload matches any operator.
    pub pattern: TokenKind,
    /// Whether the rule came from an enclosing parse call.
    pub inherited: bool,
}

impl StopRule {
    pub fn own(pattern: TokenKind) -> Self {
        Self {
            pattern,
            inherited: false,
        }
    }
}

/// The full stop set for one parse call.
#[derive(Debug, Clone)]
pub struct StopRules {
    pub rules: Vec<StopRule>,
    /// Stop as soon as the current statement has accumulated a node. Used
    /// by operand sub-parses, which must hand the following operator back
    /// to the precedence loop above them.
    pub return_on_node: bool,
}

impl StopRules {
    /// No stop triggers: parse to end of input.
    pub fn none() -> Self {
        Self {
            rules: Vec::new(),
            return_on_node: false,
        }
    }

    /// Stop rules for a top-level-like context with the given triggers.
    pub fn stopping_at(patterns: Vec<TokenKind>) -> Self {
        Self {
            rules: patterns.into_iter().map(StopRule::own).collect(),
            return_on_node: false,
        }
    }

    /// Build the rule set for a nested call: every current rule carries
    /// over as inherited, plus the child's own triggers.
    pub fn child(&self, own: Vec<TokenKind>, return_on_node: bool) -> Self {
        let mut rules: Vec<StopRule> = self
            .rules
            .iter()
            .map(|r| StopRule {
                pattern: r.pattern.clone(),
                inherited: true,
            })
            .collect();
        rules.extend(own.into_iter().map(StopRule::own));
        Self {
            rules,
            return_on_node,
        }
    }

    /// Whether the upcoming token should end this parse call.
    ///
    /// Wildcard operator rules only fire once the current statement has
    /// started, so a prefix operator can still open an operand.
    pub fn should_stop(&self, kind: &TokenKind, statement_started: bool) -> bool {
        self.rules.iter().any(|rule| {
            if let TokenKind::Operator(p) = &rule.pattern
                && p.is_empty()
                && !statement_started
            {
                return false;
            }
            kind.matches(&rule.pattern)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_trigger() {
        let rules = StopRules::stopping_at(vec![TokenKind::Bracket(')')]);
        assert!(rules.should_stop(&TokenKind::Bracket(')'), false));
        assert!(!rules.should_stop(&TokenKind::Bracket('}'), false));
    }

    #[test]
    fn wildcard_operator_waits_for_statement_start() {
        let rules = StopRules::stopping_at(vec![TokenKind::Operator(String::new())]);
        let minus = TokenKind::Operator("-".to_string());
        assert!(!rules.should_stop(&minus, false));
        assert!(rules.should_stop(&minus, true));
    }

    #[test]
    fn child_inherits_and_adds() {
        let outer = StopRules::stopping_at(vec![TokenKind::Control(';')]);
        let inner = outer.child(vec![TokenKind::Bracket(')')], true);

        assert!(inner.return_on_node);
        assert!(inner.should_stop(&TokenKind::Control(';'), false));
        assert!(inner.should_stop(&TokenKind::Bracket(')'), false));
        assert!(inner.rules[0].inherited);
        assert!(!inner.rules[1].inherited);
    }
}
